/// Business logic layer for the API service
///
/// - Like service: like/unlike toggle with a cached counter
/// - Conversation service: AI conversation ownership and message log
/// - Chat service: one chat turn with fallback replies
/// - Post and comment services: feed, creation, deletion
/// - User and auth services: search, register, login
pub mod auth;
pub mod chat;
pub mod comments;
pub mod conversations;
pub mod likes;
pub mod posts;
pub mod users;

pub use auth::{AuthService, AuthSession, LoginRequest, RegisterRequest};
pub use chat::{ChatReply, ChatService, SendMessage};
pub use comments::CommentService;
pub use conversations::ConversationService;
pub use likes::LikeService;
pub use posts::{ImageUpload, PostService};
pub use users::UserService;

use crate::error::AppError;

/// A write that names a post deleted after it was looked up hits the
/// foreign key; report it the same way as a missing post.
pub(crate) fn post_write_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::NotFound("Post not found".to_string())
        }
        _ => AppError::from(err),
    }
}
