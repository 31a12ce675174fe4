//! Social platform publishers.
//!
//! Two near-identical Graph-style APIs with one meaningful difference:
//! Instagram is two-phase (create a media container, then publish it, with
//! retry while the container is still processing) while Facebook is a single
//! POST.

pub mod facebook;
pub mod instagram;

pub use facebook::FacebookPublisher;
pub use instagram::{media_not_ready, AccountInfo, InstagramPublisher};

use sheetcast_types::SheetcastError;

/// Pull the human-readable message out of a Graph API error body
/// (`{"error": {"message", "type", "code", ...}}`).
pub(crate) fn extract_graph_error(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

pub(crate) fn api_error(service: &str, status: u16, body: &str) -> SheetcastError {
    SheetcastError::Api {
        service: service.to_string(),
        status,
        message: extract_graph_error(body),
        retryable: false,
    }
}
