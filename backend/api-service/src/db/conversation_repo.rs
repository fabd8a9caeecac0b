use super::{ConversationStore, DbResult};
use crate::models::{Conversation, ConversationSummary, Message};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// AI conversations with their message log stored as a JSONB array.
///
/// Appends use `messages || jsonb_build_array(..)` so a push is one atomic
/// statement and never rewrites earlier messages.
#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ConversationRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    messages: Json<Vec<Message>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            messages: row.messages.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait::async_trait]
impl ConversationStore for ConversationRepository {
    async fn list_conversations(&self, user_id: Uuid) -> DbResult<Vec<ConversationSummary>> {
        sqlx::query_as::<_, ConversationSummary>(
            r#"
            SELECT id, title, created_at
            FROM ai_conversations
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn find_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
    ) -> DbResult<Option<Conversation>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            SELECT id, user_id, title, messages, created_at, updated_at
            FROM ai_conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Conversation::from))
    }

    async fn insert_conversation(&self, user_id: Uuid, title: &str) -> DbResult<Conversation> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            INSERT INTO ai_conversations (user_id, title)
            VALUES ($1, $2)
            RETURNING id, user_id, title, messages, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn push_message(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        message: &Message,
    ) -> DbResult<Option<Conversation>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            UPDATE ai_conversations
            SET messages = messages || jsonb_build_array($3::jsonb),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, messages, created_at, updated_at
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(Json(message))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Conversation::from))
    }

    async fn update_title(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        title: &str,
    ) -> DbResult<Option<Conversation>> {
        let row = sqlx::query_as::<_, ConversationRow>(
            r#"
            UPDATE ai_conversations
            SET title = $3, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, messages, created_at, updated_at
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Conversation::from))
    }

    async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM ai_conversations
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
