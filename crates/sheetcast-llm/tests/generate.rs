//! HTTP-level tests for the Gemini captioner against a mock server.

use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheetcast_llm::GeminiCaptioner;
use sheetcast_types::{CaptionGenerator, SheetcastError};

#[tokio::test]
async fn generate_returns_trimmed_caption() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(serde_json::json!({
            "contents": [{}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": "  Morning light, fresh start. #coffee #morning  " }],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let captioner = GeminiCaptioner::new("test-key".into()).with_base_url(server.uri());
    let caption = captioner.generate("a cup of coffee").await.unwrap();
    assert_eq!(caption, "Morning light, fresh start. #coffee #morning");
}

#[tokio::test]
async fn generate_is_single_attempt_on_failure() {
    let server = MockServer::start().await;
    // Even a retryable-class status must only be hit once: caption
    // generation is single-attempt and fatal for the row.
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(503).set_body_json(serde_json::json!({
            "error": {"message": "model overloaded"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let captioner = GeminiCaptioner::new("test-key".into()).with_base_url(server.uri());
    let err = captioner.generate("anything").await.unwrap_err();
    assert!(matches!(err, SheetcastError::Api { status: 503, .. }));
}
