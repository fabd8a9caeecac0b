/// JWT access tokens for the API service
///
/// Tokens are signed with RS256 only. Keys are loaded once at startup from
/// PEM strings and are immutable thereafter.
///
/// ## Usage
///
/// ```rust,ignore
/// use crypto_core::jwt;
///
/// let (private_pem, public_pem) = jwt::load_keys_from_env()?;
/// jwt::initialize_jwt_keys(&private_pem, &public_pem)?;
///
/// let token = jwt::generate_access_token(user_id, "alice@example.com", "alice")?;
/// let user_id = jwt::get_user_id_from_token(&token)?;
/// ```
use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifetime of an access token. There is no refresh flow; clients log in again.
pub const ACCESS_TOKEN_EXPIRY_HOURS: i64 = 24;

const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// JWT claims carried by every access token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub email: String,
    pub username: String,
}

static JWT_ENCODING_KEY: OnceCell<EncodingKey> = OnceCell::new();
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Read the RSA key pair from `JWT_PRIVATE_KEY_PEM` / `JWT_PUBLIC_KEY_PEM`.
///
/// Literal `\n` sequences are expanded so keys can be passed through
/// single-line environment files.
pub fn load_keys_from_env() -> Result<(String, String)> {
    let private_pem = std::env::var("JWT_PRIVATE_KEY_PEM")
        .context("JWT_PRIVATE_KEY_PEM environment variable not set")?;
    let public_pem = std::env::var("JWT_PUBLIC_KEY_PEM")
        .context("JWT_PUBLIC_KEY_PEM environment variable not set")?;

    Ok((
        private_pem.replace("\\n", "\n"),
        public_pem.replace("\\n", "\n"),
    ))
}

/// Initialize JWT keys from PEM-formatted strings
///
/// Can only be called once per process; later calls return an error.
pub fn initialize_jwt_keys(private_key_pem: &str, public_key_pem: &str) -> Result<()> {
    let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA private key: {e}"))?;

    let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
        .map_err(|e| anyhow!("Failed to parse RSA public key: {e}"))?;

    JWT_ENCODING_KEY
        .set(encoding_key)
        .map_err(|_| anyhow!("JWT encoding key already initialized"))?;

    JWT_DECODING_KEY
        .set(decoding_key)
        .map_err(|_| anyhow!("JWT decoding key already initialized"))?;

    tracing::debug!("JWT keys initialized");
    Ok(())
}

fn get_encoding_key() -> Result<&'static EncodingKey> {
    JWT_ENCODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

fn get_decoding_key() -> Result<&'static DecodingKey> {
    JWT_DECODING_KEY.get().ok_or_else(|| {
        anyhow!("JWT keys not initialized. Call initialize_jwt_keys() during startup.")
    })
}

/// Generate a new access token for a user
pub fn generate_access_token(user_id: Uuid, email: &str, username: &str) -> Result<String> {
    let now = Utc::now();
    let expiry = now + Duration::hours(ACCESS_TOKEN_EXPIRY_HOURS);

    let claims = Claims {
        sub: user_id.to_string(),
        iat: now.timestamp(),
        exp: expiry.timestamp(),
        email: email.to_string(),
        username: username.to_string(),
    };

    let encoding_key = get_encoding_key()?;
    encode(&Header::new(JWT_ALGORITHM), &claims, encoding_key)
        .map_err(|e| anyhow!("Failed to generate access token: {e}"))
}

/// Validate and decode a JWT token
///
/// Verifies the RS256 signature and expiration. Never falls back to another
/// algorithm.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>> {
    let decoding_key = get_decoding_key()?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    decode::<Claims>(token, decoding_key, &validation)
        .map_err(|e| anyhow!("Token validation failed: {e}"))
}

/// Extract the user ID from a validated token
pub fn get_user_id_from_token(token: &str) -> Result<Uuid> {
    let token_data = validate_token(token)?;
    Uuid::parse_str(&token_data.claims.sub)
        .map_err(|e| anyhow!("Invalid user ID format in token: {e}"))
}
