/// Configuration management for the API service
///
/// Everything is read from environment variables (a `.env` file is loaded by
/// `main` first). Database pool settings live in `db_pool::DbConfig`.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Session cookie settings
    pub auth: AuthConfig,
    /// Gemini text/caption generation
    pub gemini: GeminiConfig,
    /// ImageKit media storage
    pub imagekit: ImageKitConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Upper bound for uploaded images, in bytes
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Mark the `token` cookie `Secure`
    pub cookie_secure: bool,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ImageKitConfig {
    pub private_key: String,
    pub upload_url: String,
    pub api_url: String,
    pub folder: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl std::fmt::Debug for ImageKitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageKitConfig")
            .field("private_key", &"[REDACTED]")
            .field("upload_url", &self.upload_url)
            .field("api_url", &self.api_url)
            .field("folder", &self.folder)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let is_production = app_env.eq_ignore_ascii_case("production");

        let app = AppConfig {
            env: app_env,
            host: std::env::var("API_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("API_SERVICE_PORT", 3000)?,
            max_upload_bytes: parse_env_or_default("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        };

        let cors = {
            let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                Ok(value) => value,
                Err(_) if is_production => {
                    return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                }
                Err(_) => "http://localhost:5173".to_string(),
            };

            if is_production && allowed_origins.trim() == "*" {
                return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
            }

            CorsConfig { allowed_origins }
        };

        let auth = AuthConfig {
            cookie_secure: parse_env_or_default("AUTH_COOKIE_SECURE", is_production)?,
        };

        let gemini = GeminiConfig {
            api_key: required_in_production("GEMINI_API_KEY", is_production)?,
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
        };

        let imagekit = ImageKitConfig {
            private_key: required_in_production("IMAGEKIT_PRIVATE_KEY", is_production)?,
            upload_url: std::env::var("IMAGEKIT_UPLOAD_URL")
                .unwrap_or_else(|_| "https://upload.imagekit.io/api/v1/files/upload".to_string()),
            api_url: std::env::var("IMAGEKIT_API_URL")
                .unwrap_or_else(|_| "https://api.imagekit.io/v1".to_string()),
            folder: std::env::var("IMAGEKIT_FOLDER")
                .unwrap_or_else(|_| "n22-social-application".to_string()),
        };

        Ok(Config {
            app,
            cors,
            auth,
            gemini,
            imagekit,
        })
    }
}

fn required_in_production(key: &str, is_production: bool) -> Result<String, String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ if is_production => Err(format!("{} must be set in production", key)),
        _ => {
            tracing::warn!("{} not set; calls to that service will fail", key);
            Ok(String::new())
        }
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "APP_ENV",
        "API_SERVICE_HOST",
        "API_SERVICE_PORT",
        "MAX_UPLOAD_BYTES",
        "CORS_ALLOWED_ORIGINS",
        "AUTH_COOKIE_SECURE",
        "GEMINI_API_KEY",
        "GEMINI_MODEL",
        "IMAGEKIT_PRIVATE_KEY",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_in_development() {
        clear_env();

        let config = Config::from_env().unwrap();
        assert_eq!(config.app.env, "development");
        assert_eq!(config.app.port, 3000);
        assert_eq!(config.app.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.cors.allowed_origins, "http://localhost:5173");
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.imagekit.folder, "n22-social-application");
    }

    #[test]
    #[serial]
    fn test_production_rejects_wildcard_cors() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "*");
        std::env::set_var("GEMINI_API_KEY", "key");
        std::env::set_var("IMAGEKIT_PRIVATE_KEY", "private");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("cannot be '*'"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_production_requires_external_keys() {
        clear_env();
        std::env::set_var("APP_ENV", "production");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "https://n22.app");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("GEMINI_API_KEY"));

        std::env::set_var("GEMINI_API_KEY", "key");
        std::env::set_var("IMAGEKIT_PRIVATE_KEY", "private");
        let config = Config::from_env().unwrap();
        assert!(config.auth.cookie_secure);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_reported() {
        clear_env();
        std::env::set_var("API_SERVICE_PORT", "not-a-port");

        let err = Config::from_env().unwrap_err();
        assert!(err.contains("API_SERVICE_PORT"));

        clear_env();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let gemini = GeminiConfig {
            api_key: "super-secret".into(),
            model: "m".into(),
            base_url: "u".into(),
        };
        assert!(!format!("{:?}", gemini).contains("super-secret"));
    }
}
