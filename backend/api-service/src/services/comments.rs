/// Comment service - append-only comments on posts
use crate::db::{CommentStore, PostStore};
use crate::error::{AppError, Result};
use crate::models::CommentView;
use crate::services::post_write_error;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentService {
    posts: Arc<dyn PostStore>,
    comments: Arc<dyn CommentStore>,
}

impl CommentService {
    pub fn new(posts: Arc<dyn PostStore>, comments: Arc<dyn CommentStore>) -> Self {
        Self { posts, comments }
    }

    pub async fn create_comment(
        &self,
        user_id: Uuid,
        post_id: Option<Uuid>,
        text: Option<&str>,
    ) -> Result<CommentView> {
        let post_id =
            post_id.ok_or_else(|| AppError::ValidationError("Post ID is required".to_string()))?;

        let text = text.map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(AppError::ValidationError(
                "Comment text cannot be empty".to_string(),
            ));
        }

        if self.posts.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comment = self
            .comments
            .insert_comment(user_id, post_id, text)
            .await
            .map_err(post_write_error)?;
        tracing::debug!(comment_id = %comment.id, %post_id, "comment created");

        Ok(comment)
    }
}
