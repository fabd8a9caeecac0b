use super::{DbResult, PostStore};
use crate::models::{NewPost, Post};
use sqlx::PgPool;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, user_id, image_url, image_file_id, caption, like_count, mentions, \
                            created_at, updated_at";

#[derive(Clone)]
pub struct PostRepository {
    pool: PgPool,
}

impl PostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PostStore for PostRepository {
    async fn insert_post(&self, post: NewPost) -> DbResult<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (user_id, image_url, image_file_id, caption, mentions)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.user_id)
        .bind(&post.image_url)
        .bind(&post.image_file_id)
        .bind(&post.caption)
        .bind(&post.mentions)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_post(&self, post_id: Uuid) -> DbResult<Option<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
        ))
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_posts(&self, skip: i64, limit: i64) -> DbResult<Vec<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_posts_by_user(&self, user_id: Uuid) -> DbResult<Vec<Post>> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn adjust_like_count(&self, post_id: Uuid, delta: i64) -> DbResult<Option<i64>> {
        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE posts
            SET like_count = GREATEST(like_count + $2, 0)
            WHERE id = $1
            RETURNING like_count
            "#,
        )
        .bind(post_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_post(&self, post_id: Uuid) -> DbResult<bool> {
        // likes and comments go with the post (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
