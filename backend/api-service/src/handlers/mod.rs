/// HTTP handlers for the social API
///
/// - Auth: register, login, logout (session cookie)
/// - Users: search by username
/// - Posts: feed, create with generated caption, delete, comments, likes
/// - AI chat: persisted conversations with the assistant
pub mod ai_chat;
pub mod auth;
pub mod posts;
pub mod users;

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;
use actix_web::{web, HttpResponse};
use uuid::Uuid;

pub use posts::UploadLimit;

/// Parse a path/body identifier; a malformed id can never match a record.
pub(crate) fn parse_id(raw: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("{} not found", entity)))
}

async fn welcome() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Welcome to the n22 social API")
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid request body: {}", err);
        AppError::ValidationError(message).into()
    })
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid query parameters: {}", err);
        AppError::ValidationError(message).into()
    })
}

/// Mount every public route on the app.
///
/// Shared state (`web::Data` services, `AuthConfig`, `UploadLimit`) is
/// registered by the caller.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .route("/", web::get().to(welcome))
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/logout", web::post().to(auth::logout)),
        )
        .service(web::scope("/users").route("/search", web::get().to(users::search_users)))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("")
                        .route(web::get().to(posts::list_posts))
                        .route(web::post().to(posts::create_post)),
                )
                .route("/user/profile", web::get().to(posts::list_my_posts))
                .route("/comment", web::post().to(posts::create_comment))
                .route("/like", web::post().to(posts::toggle_like))
                .route("/{id}", web::delete().to(posts::delete_post)),
        )
        .service(
            web::scope("/ai")
                .wrap(JwtAuthMiddleware)
                .route("/conversations", web::get().to(ai_chat::list_conversations))
                .route(
                    "/history/{conversation_id}",
                    web::get().to(ai_chat::get_history),
                )
                .route("/chat", web::post().to(ai_chat::send_message))
                .service(
                    web::resource("/conversation/{conversation_id}")
                        .route(web::patch().to(ai_chat::rename_conversation))
                        .route(web::delete().to(ai_chat::delete_conversation)),
                ),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_rejects_garbage_as_not_found() {
        let err = parse_id("not-a-uuid", "Post").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Post not found"));

        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {} ", id), "Post").unwrap(), id);
    }
}
