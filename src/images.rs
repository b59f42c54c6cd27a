//! Image store client for profile picture uploads.
//!
//! Profile pictures are not stored locally; they are pushed to an external
//! HTTP image store configured under `uploads.image_store` and only the
//! returned public URL is persisted on the user row.

use reqwest::multipart;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::{config::Config, errors::Error};

pub struct ImageStore {
    client: reqwest::Client,
    upload_url: Url,
    api_key: Option<String>,
}

/// Response body returned by the image store on a successful upload.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Url,
}

impl ImageStore {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let store_config = config.uploads.image_store.as_ref().ok_or_else(|| Error::Internal {
            operation: "upload image: image store is not configured".to_string(),
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            upload_url: store_config.upload_url.clone(),
            api_key: store_config.api_key.clone(),
        })
    }

    /// Upload image bytes and return the public URL assigned by the store.
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    pub async fn upload_profile_image(&self, data: Vec<u8>, content_type: &str) -> Result<Url, Error> {
        let part = multipart::Part::bytes(data)
            .file_name(format!("{}.img", Uuid::new_v4()))
            .mime_str(content_type)
            .map_err(|e| Error::Internal {
                operation: format!("build upload part: {e}"),
            })?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.client.post(self.upload_url.clone()).multipart(form);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| Error::Internal {
            operation: format!("upload image: {e}"),
        })?;

        if !response.status().is_success() {
            return Err(Error::Internal {
                operation: format!("upload image: store returned {}", response.status()),
            });
        }

        let body: UploadResponse = response.json().await.map_err(|e| Error::Internal {
            operation: format!("parse image store response: {e}"),
        })?;

        Ok(body.url)
    }
}
