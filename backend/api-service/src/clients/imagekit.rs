//! ImageKit media storage over its REST upload/delete API
use super::{MediaError, MediaStore, UploadedMedia};
use crate::config::ImageKitConfig;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

pub struct ImageKitClient {
    client: Client,
    private_key: String,
    upload_url: String,
    api_url: String,
    folder: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_id: String,
    url: String,
}

impl ImageKitClient {
    pub fn new(config: &ImageKitConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            private_key: config.private_key.clone(),
            upload_url: config.upload_url.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            folder: config.folder.clone(),
        })
    }
}

#[async_trait::async_trait]
impl MediaStore for ImageKitClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
    ) -> Result<UploadedMedia, MediaError> {
        let size = bytes.len();
        let file = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|e| MediaError::Upload(format!("invalid content type: {}", e)))?;

        let form = Form::new()
            .part("file", file)
            .text("fileName", file_name.to_string())
            .text("folder", self.folder.clone());

        let response = self
            .client
            .post(&self.upload_url)
            .basic_auth(&self.private_key, Some(""))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MediaError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "ImageKit upload failed");
            return Err(MediaError::Upload(format!("status {}: {}", status, body)));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Upload(format!("unreadable response: {}", e)))?;

        info!(file_id = %uploaded.file_id, size, "image uploaded to ImageKit");

        Ok(UploadedMedia {
            url: uploaded.url,
            file_id: uploaded.file_id,
        })
    }

    async fn delete(&self, file_id: &str) -> Result<(), MediaError> {
        if file_id.trim().is_empty() {
            return Err(MediaError::Delete("file id is required".to_string()));
        }

        let response = self
            .client
            .delete(format!("{}/files/{}", self.api_url, file_id))
            .basic_auth(&self.private_key, Some(""))
            .send()
            .await
            .map_err(|e| MediaError::Delete(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MediaError::Delete(format!("status {}: {}", status, body)));
        }

        info!(%file_id, "image deleted from ImageKit");
        Ok(())
    }
}
