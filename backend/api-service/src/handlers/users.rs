use crate::error::Result;
use crate::services::UserService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// GET /users/search?q=
pub async fn search_users(
    service: web::Data<UserService>,
    query: web::Query<SearchParams>,
) -> Result<HttpResponse> {
    let users = service.search_users(query.q.as_deref()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Search completed",
        "users": users,
    })))
}
