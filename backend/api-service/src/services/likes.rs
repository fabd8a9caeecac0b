/// Like service - toggles a user's like on a post and keeps the cached
/// counter in step with the membership rows.
use crate::db::{LikeStore, PostStore};
use crate::error::{AppError, Result};
use crate::models::LikeToggle;
use crate::services::post_write_error;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct LikeService {
    posts: Arc<dyn PostStore>,
    likes: Arc<dyn LikeStore>,
}

impl LikeService {
    pub fn new(posts: Arc<dyn PostStore>, likes: Arc<dyn LikeStore>) -> Self {
        Self { posts, likes }
    }

    /// Flip the like state of `(user_id, post_id)`.
    ///
    /// The counter moves only when the membership write changed a row, so a
    /// like that lost a race to an identical one does not count twice. The
    /// returned count is re-read from the post after the write.
    pub async fn toggle_like(&self, user_id: Uuid, post_id: Option<Uuid>) -> Result<LikeToggle> {
        let post_id =
            post_id.ok_or_else(|| AppError::ValidationError("Post ID is required".to_string()))?;

        if self.posts.find_post(post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let is_liked = match self.likes.find_like(user_id, post_id).await? {
            Some(_) => {
                if self.likes.delete_like(user_id, post_id).await? {
                    self.posts.adjust_like_count(post_id, -1).await?;
                }
                false
            }
            None => {
                if self
                    .likes
                    .insert_like(user_id, post_id)
                    .await
                    .map_err(post_write_error)?
                {
                    self.posts.adjust_like_count(post_id, 1).await?;
                }
                true
            }
        };

        let like_count = self
            .posts
            .find_post(post_id)
            .await?
            .map_or(0, |post| post.like_count.max(0));

        debug!(%user_id, %post_id, is_liked, like_count, "like toggled");

        Ok(LikeToggle {
            is_liked,
            like_count,
        })
    }
}
