/// Chat service - one user turn plus one AI turn per request.
///
/// Generator failures never reach the caller: the AI turn is replaced by a
/// canned reply and persisted like any other message.
use crate::clients::{CaptionGenerator, GeneratorError};
use crate::error::{AppError, Result};
use crate::models::{Message, MessageRole};
use crate::services::ConversationService;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const MAX_MESSAGE_CHARS: usize = 2000;

pub const FALLBACK_MESSAGES: [&str; 3] = [
    "I appreciate your message! The AI service is currently at capacity. Please try again in a few moments.",
    "That's an interesting question! The AI service is temporarily busy. Feel free to ask again soon.",
    "Thanks for reaching out! The AI assistant is taking a brief break. Please retry shortly.",
];

pub const GENERIC_APOLOGY: &str =
    "I encountered an issue processing your message. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    pub message: String,
    pub conversation_id: Option<Uuid>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub conversation_id: Uuid,
    pub response: Message,
}

#[derive(Clone)]
pub struct ChatService {
    conversations: ConversationService,
    generator: Arc<dyn CaptionGenerator>,
}

impl ChatService {
    pub fn new(conversations: ConversationService, generator: Arc<dyn CaptionGenerator>) -> Self {
        Self {
            conversations,
            generator,
        }
    }

    pub async fn send_message(&self, user_id: Uuid, request: SendMessage) -> Result<ChatReply> {
        let text = request.message.trim();
        if text.is_empty() {
            return Err(AppError::ValidationError("Message cannot be empty".to_string()));
        }
        if text.chars().count() > MAX_MESSAGE_CHARS {
            return Err(AppError::ValidationError(format!(
                "Message must be between 1 and {} characters",
                MAX_MESSAGE_CHARS
            )));
        }

        let conversation_id = match request.conversation_id {
            Some(id) => id,
            None => {
                self.conversations
                    .create_conversation(user_id, request.title.as_deref())
                    .await?
                    .id
            }
        };

        self.conversations
            .append_message(user_id, conversation_id, MessageRole::User, text)
            .await?;

        let reply = match self.generator.generate(text.as_bytes(), "text/plain").await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!(%conversation_id, "generator returned an empty reply");
                GENERIC_APOLOGY.to_string()
            }
            Err(err) => fallback_reply(&err).to_string(),
        };

        let conversation = self
            .conversations
            .append_message(user_id, conversation_id, MessageRole::Ai, &reply)
            .await?;

        let response = conversation
            .messages
            .last()
            .cloned()
            .ok_or_else(|| AppError::Internal("AI message missing after append".to_string()))?;

        info!(%user_id, %conversation_id, "chat turn stored");

        Ok(ChatReply {
            conversation_id,
            response,
        })
    }
}

/// Reply used in place of a failed generation
pub fn fallback_reply(err: &GeneratorError) -> &'static str {
    if err.is_quota() {
        warn!(error = %err, "generator quota exhausted, using canned reply");
        FALLBACK_MESSAGES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(FALLBACK_MESSAGES[0])
    } else {
        warn!(error = %err, "generator failed, using apology");
        GENERIC_APOLOGY
    }
}
