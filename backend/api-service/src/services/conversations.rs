/// Conversation service - user-owned AI conversations with an append-only
/// message log.
///
/// A conversation that exists but belongs to another user is reported as
/// not found, never as forbidden.
use crate::db::ConversationStore;
use crate::error::{AppError, Result};
use crate::models::{Conversation, ConversationSummary, Message, MessageRole};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_TITLE: &str = "Untitled Chat";
pub const MAX_TITLE_CHARS: usize = 100;

const NOT_FOUND: &str = "Conversation not found";

#[derive(Clone)]
pub struct ConversationService {
    store: Arc<dyn ConversationStore>,
}

impl ConversationService {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self { store }
    }

    pub async fn list_conversations(&self, user_id: Uuid) -> Result<Vec<ConversationSummary>> {
        Ok(self.store.list_conversations(user_id).await?)
    }

    /// Full message log, oldest first
    pub async fn get_history(&self, user_id: Uuid, conversation_id: Uuid) -> Result<Vec<Message>> {
        self.store
            .find_conversation(user_id, conversation_id)
            .await?
            .map(|conversation| conversation.messages)
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    /// Start an empty conversation. A missing or blank title falls back to
    /// the default; a long one is cut to `MAX_TITLE_CHARS`.
    pub async fn create_conversation(
        &self,
        user_id: Uuid,
        title: Option<&str>,
    ) -> Result<Conversation> {
        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => truncate_title(t),
            _ => DEFAULT_TITLE,
        };

        Ok(self.store.insert_conversation(user_id, title).await?)
    }

    pub async fn append_message(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        role: MessageRole,
        text: &str,
    ) -> Result<Conversation> {
        if text.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Message text cannot be empty".to_string(),
            ));
        }

        let message = Message::new(role, text);
        self.store
            .push_message(user_id, conversation_id, &message)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn rename_conversation(
        &self,
        user_id: Uuid,
        conversation_id: Uuid,
        title: Option<&str>,
    ) -> Result<Conversation> {
        let title = title.map(str::trim).unwrap_or_default();
        if title.is_empty() {
            return Err(AppError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        let title = check_title_length(title)?;

        self.store
            .update_title(user_id, conversation_id, title)
            .await?
            .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))
    }

    pub async fn delete_conversation(&self, user_id: Uuid, conversation_id: Uuid) -> Result<()> {
        if self
            .store
            .delete_conversation(user_id, conversation_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::NotFound(NOT_FOUND.to_string()))
        }
    }
}

fn truncate_title(title: &str) -> &str {
    match title.char_indices().nth(MAX_TITLE_CHARS) {
        Some((cut, _)) => title[..cut].trim_end(),
        None => title,
    }
}

fn check_title_length(title: &str) -> Result<&str> {
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::ValidationError(format!(
            "Title must be between 1 and {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(title)
}
