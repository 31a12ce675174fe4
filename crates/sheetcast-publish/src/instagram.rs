//! Two-phase Instagram publish: create a media container, then publish it.

use async_trait::async_trait;

use sheetcast_types::{
    retry_call, BackoffPolicy, Publisher, Result, SheetcastError, MAX_ATTEMPTS,
};

use crate::api_error;

const DEFAULT_BASE_URL: &str = "https://graph.instagram.com/v21.0";

/// Error code/subcode pair the Graph API returns while a freshly created
/// container is still being processed server-side.
const MEDIA_NOT_READY_CODE: u64 = 9007;
const MEDIA_NOT_READY_SUBCODE: u64 = 2207027;

/// Returns `true` when a publish error body carries the media-not-ready
/// signature, regardless of HTTP status.
pub fn media_not_ready(body: &serde_json::Value) -> bool {
    body["error"]["code"].as_u64() == Some(MEDIA_NOT_READY_CODE)
        && body["error"]["error_subcode"].as_u64() == Some(MEDIA_NOT_READY_SUBCODE)
}

#[derive(Debug)]
pub struct InstagramPublisher {
    client: reqwest::Client,
    base_url: String,
    account_id: String,
    access_token: String,
    backoff: BackoffPolicy,
}

impl InstagramPublisher {
    pub fn new(account_id: String, access_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            account_id,
            access_token,
            backoff: BackoffPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_backoff(mut self, policy: BackoffPolicy) -> Self {
        self.backoff = policy;
        self
    }

    /// Phase 1: create a media container for the image+caption. Single POST,
    /// any failure is fatal for the row.
    pub async fn create_container(&self, image_url: &str, caption: &str) -> Result<String> {
        let url = format!("{}/{}/media", self.base_url, self.account_id);
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("image_url", image_url),
                ("caption", caption),
                ("access_token", &self.access_token),
            ])
            .send()
            .await
            .map_err(|e| SheetcastError::Network {
                service: "instagram".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| SheetcastError::Network {
            service: "instagram".into(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(api_error("instagram", status.as_u16(), &body));
        }

        let json: serde_json::Value = serde_json::from_str(&body)?;
        let media_id = json["id"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| SheetcastError::MissingField {
                service: "instagram".into(),
                field: "id".into(),
            })?;
        tracing::info!(media_id = %media_id, "Created media container");
        Ok(media_id)
    }

    /// Phase 2: publish the container, retrying with backoff while the
    /// server reports it is not ready yet.
    pub async fn publish_container(&self, media_id: &str) -> Result<String> {
        retry_call("instagram.publish", MAX_ATTEMPTS, &self.backoff, || {
            self.publish_once(media_id)
        })
        .await
    }

    async fn publish_once(&self, media_id: &str) -> Result<String> {
        let url = format!("{}/{}/media_publish", self.base_url, self.account_id);
        let resp = self
            .client
            .post(&url)
            .form(&[
                ("creation_id", media_id),
                ("access_token", &self.access_token),
            ])
            .send()
            .await
            .map_err(|e| SheetcastError::Network {
                service: "instagram".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| SheetcastError::Network {
            service: "instagram".into(),
            message: e.to_string(),
        })?;

        if status.as_u16() == 200 {
            let json: serde_json::Value = serde_json::from_str(&body)?;
            return json["id"]
                .as_str()
                .map(String::from)
                .ok_or_else(|| SheetcastError::MissingField {
                    service: "instagram".into(),
                    field: "id".into(),
                });
        }

        let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
        if media_not_ready(&json) {
            return Err(SheetcastError::MediaNotReady {
                media_id: media_id.to_string(),
            });
        }
        Err(api_error("instagram", status.as_u16(), &body))
    }
}

/// Identity reported by the Graph API for an access token.
#[derive(Debug, serde::Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub username: Option<String>,
}

impl InstagramPublisher {
    /// Verify the access token by asking the Graph API who it belongs to.
    pub async fn account_info(&self) -> Result<AccountInfo> {
        let url = format!("{}/me", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fields", "id,username"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SheetcastError::Network {
                service: "instagram".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| SheetcastError::Network {
            service: "instagram".into(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(api_error("instagram", status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Publisher for InstagramPublisher {
    fn platform(&self) -> &str {
        "instagram"
    }

    async fn publish_photo(&self, image_url: &str, caption: &str) -> Result<String> {
        let media_id = self.create_container(image_url, caption).await?;
        let post_id = self.publish_container(&media_id).await?;
        tracing::info!(post_id = %post_id, "Posted to Instagram");
        Ok(post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_not_ready_requires_both_code_and_subcode() {
        let hit = serde_json::json!({
            "error": {"message": "Media is not ready", "code": 9007, "error_subcode": 2207027}
        });
        assert!(media_not_ready(&hit));

        let wrong_subcode = serde_json::json!({
            "error": {"code": 9007, "error_subcode": 1}
        });
        assert!(!media_not_ready(&wrong_subcode));

        let wrong_code = serde_json::json!({
            "error": {"code": 100, "error_subcode": 2207027}
        });
        assert!(!media_not_ready(&wrong_code));

        assert!(!media_not_ready(&serde_json::json!({})));
        assert!(!media_not_ready(&serde_json::Value::Null));
    }

    #[test]
    fn constructor_defaults() {
        let publisher = InstagramPublisher::new("acct".into(), "tok".into());
        assert_eq!(publisher.platform(), "instagram");
        assert!(publisher.base_url.contains("graph.instagram.com"));
    }
}
