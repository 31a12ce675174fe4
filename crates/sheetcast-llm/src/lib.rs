//! Caption generation via the Gemini `generateContent` API.
//!
//! One prompt in, one trimmed caption out. There is no retry at this layer:
//! a failed generation is fatal for the row being processed.

use async_trait::async_trait;
use serde_json::json;

use sheetcast_types::{CaptionGenerator, Result, SheetcastError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model selection is a configuration constant, not a per-request knob.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Instructional template wrapped around each row's prompt text. The
/// constraints (single output, ≤150 words, trending hashtags) are
/// communicated to the model, not enforced programmatically.
pub fn build_caption_prompt(subject: &str) -> String {
    format!(
        "Generate a single, concise Instagram post description in English (max 150 words) \
         including trending hashtags relevant to the content and brand for an image generated \
         by AI based on the following prompt: '{subject}'. The description should be engaging, \
         highlight the key elements of the image or product, and align with the brand's \
         aesthetic. Do not provide multiple options; provide only one description with a \
         maximum of 150 words, including trending hashtags relevant to the content and brand."
    )
}

#[derive(Debug)]
pub struct GeminiCaptioner {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GeminiCaptioner {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        })
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<String> {
        let candidates = json["candidates"]
            .as_array()
            .ok_or_else(|| SheetcastError::MissingField {
                service: "gemini".into(),
                field: "candidates".into(),
            })?;
        let candidate = candidates.first().ok_or_else(|| SheetcastError::Api {
            service: "gemini".into(),
            status: 0,
            message: "Empty candidates array".into(),
            retryable: false,
        })?;

        let mut text = String::new();
        if let Some(parts) = candidate["content"]["parts"].as_array() {
            for part in parts {
                if let Some(t) = part["text"].as_str() {
                    text.push_str(t);
                }
            }
        }

        if text.trim().is_empty() {
            return Err(SheetcastError::MissingField {
                service: "gemini".into(),
                field: "content.parts.text".into(),
            });
        }
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl CaptionGenerator for GeminiCaptioner {
    async fn generate(&self, subject: &str) -> Result<String> {
        let prompt = build_caption_prompt(subject);
        let body = self.build_request_body(&prompt);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        tracing::debug!(model = %self.model, "Requesting caption");
        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SheetcastError::Network {
                service: "gemini".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let response_body = resp.text().await.map_err(|e| SheetcastError::Network {
            service: "gemini".into(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(map_error(status, &response_body));
        }

        let json: serde_json::Value = serde_json::from_str(&response_body)?;
        let caption = self.parse_response(json)?;
        tracing::info!(chars = caption.len(), "Generated caption");
        Ok(caption)
    }
}

fn map_error(status: reqwest::StatusCode, body: &str) -> SheetcastError {
    let status_u16 = status.as_u16();
    SheetcastError::Api {
        service: "gemini".into(),
        status: status_u16,
        message: extract_error_message(body),
        retryable: matches!(status_u16, 429 | 500 | 503),
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1. The prompt template embeds the row's subject text
    #[test]
    fn caption_prompt_embeds_subject() {
        let prompt = build_caption_prompt("a ceramic mug at sunrise");
        assert!(prompt.contains("'a ceramic mug at sunrise'"));
        assert!(prompt.contains("max 150 words"));
        assert!(prompt.contains("trending hashtags"));
    }

    // 2. Request body carries the prompt as a single text part
    #[test]
    fn request_body_single_text_part() {
        let captioner = GeminiCaptioner::new("key".into());
        let body = captioner.build_request_body("hello");
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["parts"][0]["text"], "hello");
    }

    // 3. Response parsing joins parts and trims whitespace
    #[test]
    fn parse_response_joins_and_trims() {
        let captioner = GeminiCaptioner::new("key".into());
        let json = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "  Golden hour glow " }, { "text": "#sunset \n" }],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        });
        let caption = captioner.parse_response(json).unwrap();
        assert_eq!(caption, "Golden hour glow #sunset");
    }

    // 4. Missing candidates is a missing-field error
    #[test]
    fn parse_response_missing_candidates() {
        let captioner = GeminiCaptioner::new("key".into());
        let err = captioner
            .parse_response(serde_json::json!({"promptFeedback": {}}))
            .unwrap_err();
        assert!(matches!(
            err,
            SheetcastError::MissingField { field, .. } if field == "candidates"
        ));
    }

    // 5. Candidate without text is a missing-field error
    #[test]
    fn parse_response_empty_text() {
        let captioner = GeminiCaptioner::new("key".into());
        let json = serde_json::json!({
            "candidates": [{ "content": { "parts": [], "role": "model" } }]
        });
        assert!(captioner.parse_response(json).is_err());
    }

    // 6. Defaults
    #[test]
    fn constructor_defaults() {
        let captioner = GeminiCaptioner::new("test-key".into());
        assert_eq!(captioner.model, DEFAULT_MODEL);
        assert!(captioner.base_url.contains("generativelanguage.googleapis.com"));

        let custom = GeminiCaptioner::new("k".into())
            .with_base_url("http://localhost:1".into())
            .with_model("gemini-exp".into());
        assert_eq!(custom.base_url, "http://localhost:1");
        assert_eq!(custom.model, "gemini-exp");
    }

    // 7. Error mapping classifies server-side failures as retryable
    #[test]
    fn error_mapping() {
        let err = map_error(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            r#"{"error": {"message": "overloaded"}}"#,
        );
        assert!(err.is_retryable());
        assert!(err.to_string().contains("overloaded"));

        let err = map_error(reqwest::StatusCode::BAD_REQUEST, "bad key");
        assert!(!err.is_retryable());
    }
}
