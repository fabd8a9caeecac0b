//! Gemini `generateContent` client for captions and chat replies
use super::{CaptionGenerator, GeneratorError};
use crate::config::GeminiConfig;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CAPTION_PROMPT: &str = "Write one short, engaging social media caption for this image. \
     Add one or two fitting emojis and hashtags. Reply with the caption only.";

const CHAT_INSTRUCTION: &str = "You are the friendly assistant of the n22 social app. \
     Answer the user's message clearly and concisely.";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
        })
    }

    fn build_request(bytes: &[u8], content_type: &str) -> GenerateRequest {
        if content_type.starts_with("text/") {
            return GenerateRequest {
                system_instruction: Some(Content {
                    role: None,
                    parts: vec![text_part(CHAT_INSTRUCTION)],
                }),
                contents: vec![Content {
                    role: Some("user".to_string()),
                    parts: vec![text_part(&String::from_utf8_lossy(bytes))],
                }],
            };
        }

        GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: content_type.to_string(),
                            data: BASE64.encode(bytes),
                        }),
                    },
                    text_part(CAPTION_PROMPT),
                ],
            }],
        }
    }
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        inline_data: None,
    }
}

fn extract_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[async_trait::async_trait]
impl CaptionGenerator for GeminiClient {
    async fn generate(&self, bytes: &[u8], content_type: &str) -> Result<String, GeneratorError> {
        let request = Self::build_request(bytes, content_type);
        let start = std::time::Instant::now();

        // The endpoint is kept out of error text: it would leak into logs
        // and confuse quota classification.
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| GeneratorError::Other(format!("Gemini call failed: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Gemini request failed");

            let message = format!("Gemini error ({}): {}", status, body);
            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                GeneratorError::QuotaExceeded(message)
            } else {
                GeneratorError::from_message(message)
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            GeneratorError::Other(format!("Gemini response unreadable: {}", e.without_url()))
        })?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            content_type, "Gemini response received"
        );

        extract_text(parsed)
            .ok_or_else(|| GeneratorError::Other("Gemini returned no text".to_string()))
    }
}
