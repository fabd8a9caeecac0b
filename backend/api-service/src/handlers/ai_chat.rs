/// AI chat handlers - conversations owned by the authenticated user
use crate::error::Result;
use crate::handlers::parse_id;
use crate::middleware::UserId;
use crate::models::ConversationSummary;
use crate::services::{ChatService, ConversationService, SendMessage};
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
    pub conversation_id: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub title: Option<String>,
}

/// GET /ai/conversations
pub async fn list_conversations(
    service: web::Data<ConversationService>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let conversations = service.list_conversations(user_id.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Conversations fetched successfully",
        "conversations": conversations,
    })))
}

/// GET /ai/history/{conversation_id}
pub async fn get_history(
    service: web::Data<ConversationService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let conversation_id = parse_id(&path, "Conversation")?;
    let history = service.get_history(user_id.0, conversation_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Conversation messages fetched successfully",
        "history": history,
    })))
}

/// POST /ai/chat
pub async fn send_message(
    service: web::Data<ChatService>,
    user_id: UserId,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let conversation_id = match req.conversation_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "Conversation")?),
        _ => None,
    };

    let reply = service
        .send_message(
            user_id.0,
            SendMessage {
                message: req.message,
                conversation_id,
                title: req.title,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Message sent successfully",
        "conversationId": reply.conversation_id,
        "response": reply.response,
    })))
}

/// PATCH /ai/conversation/{conversation_id}
pub async fn rename_conversation(
    service: web::Data<ConversationService>,
    user_id: UserId,
    path: web::Path<String>,
    req: web::Json<RenameRequest>,
) -> Result<HttpResponse> {
    let conversation_id = parse_id(&path, "Conversation")?;
    let conversation = service
        .rename_conversation(user_id.0, conversation_id, req.title.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Conversation updated successfully",
        "conversation": ConversationSummary::from(&conversation),
    })))
}

/// DELETE /ai/conversation/{conversation_id}
pub async fn delete_conversation(
    service: web::Data<ConversationService>,
    user_id: UserId,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let conversation_id = parse_id(&path, "Conversation")?;
    service.delete_conversation(user_id.0, conversation_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Conversation deleted successfully",
        "conversationId": conversation_id,
    })))
}
