/// Database access layer
///
/// Each collection is a store trait with a PostgreSQL repository behind it.
/// Services depend on the traits only, so they can run against any backend
/// that honours the same contracts. Every method is a single SQL statement.
pub mod comment_repo;
pub mod conversation_repo;
pub mod like_repo;
pub mod post_repo;
pub mod user_repo;

pub use comment_repo::CommentRepository;
pub use conversation_repo::ConversationRepository;
pub use like_repo::LikeRepository;
pub use post_repo::PostRepository;
pub use user_repo::{escape_like, UserRepository};

use crate::models::{
    CommentView, Conversation, ConversationSummary, Like, Message, NewPost, NewUser, Post, User,
    UserSummary,
};
use sqlx::migrate::Migrator;
use uuid::Uuid;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub type DbResult<T> = std::result::Result<T, sqlx::Error>;

#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: NewPost) -> DbResult<Post>;

    async fn find_post(&self, post_id: Uuid) -> DbResult<Option<Post>>;

    /// Newest first
    async fn list_posts(&self, skip: i64, limit: i64) -> DbResult<Vec<Post>>;

    /// Newest first
    async fn list_posts_by_user(&self, user_id: Uuid) -> DbResult<Vec<Post>>;

    /// Atomically apply `delta` to the like counter, clamped at zero.
    /// Returns the new value, or `None` when the post does not exist.
    async fn adjust_like_count(&self, post_id: Uuid, delta: i64) -> DbResult<Option<i64>>;

    /// Delete a post together with its likes and comments.
    /// Returns false when nothing was deleted.
    async fn delete_post(&self, post_id: Uuid) -> DbResult<bool>;
}

#[async_trait::async_trait]
pub trait LikeStore: Send + Sync {
    async fn find_like(&self, user_id: Uuid, post_id: Uuid) -> DbResult<Option<Like>>;

    /// Insert if absent. Returns true only when a row was created.
    async fn insert_like(&self, user_id: Uuid, post_id: Uuid) -> DbResult<bool>;

    /// Delete if present. Returns true only when a row was removed.
    async fn delete_like(&self, user_id: Uuid, post_id: Uuid) -> DbResult<bool>;

    /// Subset of `post_ids` the user has liked
    async fn liked_post_ids(&self, user_id: Uuid, post_ids: &[Uuid]) -> DbResult<Vec<Uuid>>;
}

#[async_trait::async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, user_id: Uuid, post_id: Uuid, text: &str)
        -> DbResult<CommentView>;

    /// Comments for all given posts, newest first
    async fn comments_for_posts(&self, post_ids: &[Uuid]) -> DbResult<Vec<CommentView>>;
}

/// Every method is scoped by `(user_id, conversation_id)`; a conversation
/// owned by someone else is indistinguishable from a missing one.
#[async_trait::async_trait]
pub trait ConversationStore: Send + Sync {
    /// Newest first
    async fn list_conversations(&self, user_id: Uuid) -> DbResult<Vec<ConversationSummary>>;

    async fn find_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> DbResult<Option<Conversation>>;

    async fn insert_conversation(&self, user_id: Uuid, title: &str) -> DbResult<Conversation>;

    /// Append one message and refresh `updated_at` in one atomic write
    async fn push_message(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message: &Message,
    ) -> DbResult<Option<Conversation>>;

    async fn update_title(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        title: &str,
    ) -> DbResult<Option<Conversation>>;

    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> DbResult<bool>;
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> DbResult<User>;

    async fn find_by_id(&self, user_id: Uuid) -> DbResult<Option<User>>;

    /// Match on email (case-insensitive) or exact username
    async fn find_by_identifier(&self, identifier: &str) -> DbResult<Option<User>>;

    async fn exists_by_username_or_email(&self, username: &str, email: &str) -> DbResult<bool>;

    async fn find_by_usernames(&self, usernames: &[String]) -> DbResult<Vec<UserSummary>>;

    async fn find_summaries(&self, user_ids: &[Uuid]) -> DbResult<Vec<UserSummary>>;

    /// Case-insensitive substring match on username or email
    async fn search_users(&self, term: &str, limit: i64) -> DbResult<Vec<UserSummary>>;
}
