//! Shared types for the sheetcast posting pipeline.
//!
//! This crate provides the foundational pieces used across all other sheetcast
//! crates:
//! - `SheetcastError` — unified error taxonomy
//! - `Row` / `RunContext` — the unit of work and the per-run state threaded
//!   through every workflow step
//! - `retry` — bounded retry with exponential backoff
//! - the async trait seams (`RowSource`, `CaptionGenerator`, `Publisher`)
//!   implemented by the client crates

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod retry;

pub use retry::{retry_call, BackoffPolicy, MAX_ATTEMPTS};

/// Unified error type for all sheetcast subsystems.
#[derive(Debug, thiserror::Error)]
pub enum SheetcastError {
    #[error("{service} returned HTTP {status}: {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Network error talking to {service}: {message}")]
    Network { service: String, message: String },

    #[error("{service} response missing field '{field}'")]
    MissingField { service: String, field: String },

    #[error("Media container {media_id} not ready for publish")]
    MediaNotReady { media_id: String },

    #[error("Max retries exhausted for {operation} after {attempts} attempts")]
    RetriesExhausted { operation: String, attempts: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SheetcastError {
    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry: rate limits and server-side failures flagged retryable, and
    /// the Instagram media-not-ready signature. Transport failures are fatal;
    /// retrying them tends to double-post when the request went through but
    /// the response was lost.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SheetcastError::Api {
                retryable: true,
                ..
            } | SheetcastError::MediaNotReady { .. }
        )
    }

    /// Returns `true` if the error must abort the process before any row is
    /// touched.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SheetcastError::Config(_))
    }
}

/// A convenience alias for `Result<T, SheetcastError>`.
pub type Result<T> = std::result::Result<T, SheetcastError>;

// ---------------------------------------------------------------------------
// Row — one unit of work from the tabular source
// ---------------------------------------------------------------------------

/// A pending post: sheet row number plus the two cells that drive the
/// pipeline. Row numbers are 1-based sheet coordinates, so the first data row
/// (after the header) is 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub row_number: u32,
    pub prompt: String,
    pub image_url: String,
}

// ---------------------------------------------------------------------------
// RunContext — mutable per-run state threaded through the workflow
// ---------------------------------------------------------------------------

/// Error string recorded when a step is entered past the last row. This is a
/// normal termination signal, not a fault.
pub const NO_MORE_ROWS: &str = "No more rows to process";

/// The mutable state owned by the workflow controller and passed by exclusive
/// reference into each step. `current_index` only ever increases; the per-row
/// fields are reset by [`advance`](RunContext::advance) after the clear step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunContext {
    pub rows: Vec<Row>,
    pub current_index: usize,
    pub caption: Option<String>,
    pub instagram_post_id: Option<String>,
    pub facebook_post_id: Option<String>,
    pub error: Option<String>,
}

impl RunContext {
    /// The row currently being processed, if any remain.
    pub fn current_row(&self) -> Option<&Row> {
        self.rows.get(self.current_index)
    }

    /// Whether every fetched row has been visited.
    pub fn exhausted(&self) -> bool {
        self.current_index >= self.rows.len()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Move to the next row: bump the index, drop the per-row fields, and
    /// clear any error so the next row starts fresh.
    pub fn advance(&mut self) {
        self.current_index += 1;
        self.caption = None;
        self.instagram_post_id = None;
        self.facebook_post_id = None;
        self.error = None;
    }
}

// ---------------------------------------------------------------------------
// Trait seams implemented by the client crates
// ---------------------------------------------------------------------------

/// Fetches eligible rows from the tabular source and clears processed ones.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<Row>>;
    async fn clear_row(&self, row_number: u32) -> Result<()>;
}

/// Produces one marketing caption for a row's prompt text.
#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn generate(&self, subject: &str) -> Result<String>;
}

/// Publishes one image+caption to a social platform and reports the platform
/// post identifier.
#[async_trait]
pub trait Publisher: Send + Sync {
    fn platform(&self) -> &str;
    async fn publish_photo(&self, image_url: &str, caption: &str) -> Result<String>;
}
