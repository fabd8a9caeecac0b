//! Outbound collaborators: text/caption generation and media storage.

pub mod gemini;
pub mod imagekit;

pub use gemini::GeminiClient;
pub use imagekit::ImageKitClient;

/// Upstream generation failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum GeneratorError {
    #[error("generator quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("generator request failed: {0}")]
    Other(String),
}

impl GeneratorError {
    /// Classify an upstream error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if indicates_quota(&message) {
            GeneratorError::QuotaExceeded(message)
        } else {
            GeneratorError::Other(message)
        }
    }

    /// True when the failure looks like quota or rate limiting.
    pub fn is_quota(&self) -> bool {
        match self {
            GeneratorError::QuotaExceeded(_) => true,
            GeneratorError::Other(message) => indicates_quota(message),
        }
    }
}

const QUOTA_MARKERS: [&str; 2] = ["quota", "429"];
const RATE_LIMIT_MARKERS: [&str; 4] = ["rate limit", "rate-limit", "rate_limit", "ratelimit"];

fn indicates_quota(message: &str) -> bool {
    let lowered = message.to_lowercase();
    QUOTA_MARKERS.iter().any(|needle| lowered.contains(needle))
        || RATE_LIMIT_MARKERS
            .iter()
            .any(|needle| contains_word_start(&lowered, needle))
}

/// True when `needle` occurs in `haystack` not preceded by a letter or digit,
/// so "generate limit" never reads as "rate limit".
fn contains_word_start(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(idx, _)| {
        haystack[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric())
    })
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media upload failed: {0}")]
    Upload(String),
    #[error("media delete failed: {0}")]
    Delete(String),
}

/// Stored media handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub url: String,
    pub file_id: String,
}

/// Generates text from a payload: a caption for images, a reply for
/// `text/plain` chat messages.
#[async_trait::async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn generate(&self, bytes: &[u8], content_type: &str) -> Result<String, GeneratorError>;
}

#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadedMedia, MediaError>;

    async fn delete(&self, file_id: &str) -> Result<(), MediaError>;
}
