/// Auth handlers - register, login and logout with an HttpOnly session cookie
use crate::config::AuthConfig;
use crate::error::Result;
use crate::middleware::{UserId, TOKEN_COOKIE};
use crate::services::{AuthService, AuthSession, LoginRequest, RegisterRequest};
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::{web, HttpResponse};
use crypto_core::jwt::ACCESS_TOKEN_EXPIRY_HOURS;

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS))
        .finish()
}

fn cookie_secure(config: &Option<web::Data<AuthConfig>>) -> bool {
    config.as_ref().map(|c| c.cookie_secure).unwrap_or(false)
}

fn session_body(message: &str, session: &AuthSession) -> serde_json::Value {
    serde_json::json!({
        "message": message,
        "user": session.user,
        "token": session.token,
    })
}

/// POST /auth/register
pub async fn register(
    service: web::Data<AuthService>,
    config: Option<web::Data<AuthConfig>>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let session = service.register(req.into_inner()).await?;

    Ok(HttpResponse::Created()
        .cookie(session_cookie(session.token.clone(), cookie_secure(&config)))
        .json(session_body("User registered successfully", &session)))
}

/// POST /auth/login
pub async fn login(
    service: web::Data<AuthService>,
    config: Option<web::Data<AuthConfig>>,
    req: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let session = service.login(req.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(session.token.clone(), cookie_secure(&config)))
        .json(session_body("Login successful", &session)))
}

/// POST /auth/logout
pub async fn logout(user_id: UserId) -> HttpResponse {
    let mut removal = Cookie::build(TOKEN_COOKIE, "").path("/").finish();
    removal.make_removal();

    tracing::debug!(user_id = %user_id.0, "user logged out");

    HttpResponse::Ok()
        .cookie(removal)
        .json(serde_json::json!({ "message": "Logged out successfully" }))
}
