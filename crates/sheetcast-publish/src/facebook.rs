//! Single-phase Facebook photo publish.

use async_trait::async_trait;

use sheetcast_types::{Publisher, Result, SheetcastError};

use crate::api_error;

const DEFAULT_BASE_URL: &str = "https://graph.facebook.com/v21.0";

#[derive(Debug)]
pub struct FacebookPublisher {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl FacebookPublisher {
    pub fn new(access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

#[async_trait]
impl Publisher for FacebookPublisher {
    fn platform(&self) -> &str {
        "facebook"
    }

    /// One POST to `/me/photos`. No retry: a failure here is fatal for the
    /// row and the run.
    async fn publish_photo(&self, image_url: &str, caption: &str) -> Result<String> {
        let url = format!("{}/me/photos", self.base_url);
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("url", image_url),
                ("caption", caption),
                ("access_token", &self.access_token),
            ])
            .send()
            .await
            .map_err(|e| SheetcastError::Network {
                service: "facebook".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| SheetcastError::Network {
            service: "facebook".into(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(api_error("facebook", status.as_u16(), &body));
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        let post_id = json["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| SheetcastError::MissingField {
                service: "facebook".into(),
                field: "id".into(),
            })?;
        tracing::info!(post_id = %post_id, "Posted to Facebook");
        Ok(post_id)
    }
}
