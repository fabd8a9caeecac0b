/// Data models for the API service
///
/// Records serialize in camelCase with the identifier under `_id`, which is
/// the shape the web client reads.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// =====================================================================
// Users
// =====================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub image: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public projection of a user, safe to embed in any response
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub image: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// =====================================================================
// Posts, likes, comments
// =====================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "image")]
    pub image_url: String,
    pub image_file_id: Option<String>,
    pub caption: String,
    /// Cached count of like rows; never negative
    pub like_count: i64,
    pub mentions: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub image_url: String,
    pub image_file_id: Option<String>,
    pub caption: String,
    pub mentions: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    #[serde(rename = "post")]
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's username
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub username: String,
    #[serde(rename = "post")]
    pub post_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Post as shown in feeds and profiles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user: UserSummary,
    pub image: String,
    pub caption: String,
    pub like_count: i64,
    pub mentions: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    /// Present only when the request carried a valid session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_liked: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostView {
    pub fn new(post: Post, user: UserSummary) -> Self {
        Self {
            id: post.id,
            user,
            image: post.image_url,
            caption: post.caption,
            like_count: post.like_count.max(0),
            mentions: post.mentions,
            comments: Vec::new(),
            is_liked: None,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub is_liked: bool,
    pub like_count: i64,
}

// =====================================================================
// AI conversations
// =====================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Ai,
}

/// One entry of a conversation's append-only log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: MessageRole,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: Uuid,
    pub title: String,
    /// Oldest first
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Conversation> for ConversationSummary {
    fn from(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id,
            title: conversation.title.clone(),
            created_at: conversation.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_never_serializes_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            image: None,
            bio: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["_id"], user.id.to_string());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_message_role_wire_format() {
        let msg = Message::new(MessageRole::Ai, "hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "ai");
        assert!(json.get("createdAt").is_some());

        let parsed: Message = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.role, MessageRole::Ai);
    }

    #[test]
    fn test_post_view_omits_is_liked_for_anonymous() {
        let now = Utc::now();
        let author = UserSummary {
            id: Uuid::new_v4(),
            username: "bob".into(),
            email: "bob@example.com".into(),
            image: None,
        };
        let post = Post {
            id: Uuid::new_v4(),
            user_id: author.id,
            image_url: "https://ik.imagekit.io/x.jpg".into(),
            image_file_id: Some("file_1".into()),
            caption: "sunset".into(),
            like_count: 3,
            mentions: vec![],
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(PostView::new(post, author)).unwrap();
        assert!(json.get("isLiked").is_none());
        assert_eq!(json["likeCount"], 3);
        assert_eq!(json["user"]["username"], "bob");
    }
}
