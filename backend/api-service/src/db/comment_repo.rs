use super::{CommentStore, DbResult};
use crate::models::CommentView;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct CommentRepository {
    pool: PgPool,
}

impl CommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CommentStore for CommentRepository {
    async fn insert_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        text: &str,
    ) -> DbResult<CommentView> {
        sqlx::query_as::<_, CommentView>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (user_id, post_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, user_id, post_id, text, created_at
            )
            SELECT i.id, u.username, i.post_id, i.text, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
    }

    async fn comments_for_posts(&self, post_ids: &[Uuid]) -> DbResult<Vec<CommentView>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, u.username, c.post_id, c.text, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.post_id = ANY($1)
            ORDER BY c.created_at DESC
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
    }
}
