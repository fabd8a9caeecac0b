/// Auth service - registration and login backed by argon2 hashes and RS256
/// access tokens.
use crate::db::UserStore;
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};
use crypto_core::{hash_password, jwt, verify_password};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(
        length(min = 3, max = 30, message = "Username must be between 3 and 30 characters"),
        custom(function = "validate_username_chars")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

/// `identifier` accepts an email or a username
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, alias = "email", alias = "username")]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

/// Authenticated user together with a freshly issued access token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

fn validate_username_chars(username: &str) -> std::result::Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_chars");
        err.message =
            Some("Username may only contain letters, numbers, underscores and dots".into());
        Err(err)
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession> {
        let request = RegisterRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            password: request.password,
        };
        request.validate()?;

        if self
            .users
            .exists_by_username_or_email(&request.username, &request.email)
            .await?
        {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;

        let user = self
            .users
            .insert_user(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
            })
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                    AppError::Conflict("Username or email already exists".to_string())
                }
                _ => AppError::from(err),
            })?;

        info!(user_id = %user.id, "user registered");
        self.issue_session(user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession> {
        let identifier = request.identifier.trim();
        if identifier.is_empty() || request.password.is_empty() {
            return Err(AppError::ValidationError(
                "Email or username and password are required".to_string(),
            ));
        }

        let user = self
            .users
            .find_by_identifier(identifier)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        info!(user_id = %user.id, "user logged in");
        self.issue_session(user)
    }

    fn issue_session(&self, user: User) -> Result<AuthSession> {
        let token = jwt::generate_access_token(user.id, &user.email, &user.username)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {e}")))?;

        Ok(AuthSession { user, token })
    }
}
