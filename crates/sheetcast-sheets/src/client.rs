//! Sheets v4 values API client.

use async_trait::async_trait;
use serde::Deserialize;

use sheetcast_types::{retry_call, BackoffPolicy, Result, Row, RowSource, SheetcastError, MAX_ATTEMPTS};

use crate::rows::filter_rows;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Widest column the pipeline reads or clears. The working range is
/// `A1:DZ` and the per-row clear range is `A{n}:DZ{n}`.
const LAST_COLUMN: &str = "DZ";

#[derive(Debug)]
pub struct SheetsClient {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
    spreadsheet_id: String,
    sheet_name: String,
    backoff: BackoffPolicy,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

impl SheetsClient {
    pub fn new(access_token: String, spreadsheet_id: String, sheet_name: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token,
            spreadsheet_id,
            sheet_name,
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

    fn read_range(&self) -> String {
        format!("{}!A1:{}", self.sheet_name, LAST_COLUMN)
    }

    fn clear_range(&self, row_number: u32) -> String {
        format!(
            "{sheet}!A{row}:{col}{row}",
            sheet = self.sheet_name,
            row = row_number,
            col = LAST_COLUMN
        )
    }

    /// One GET of the working range, formatted-value rendering.
    async fn fetch_values_once(&self) -> Result<Vec<Vec<String>>> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url,
            self.spreadsheet_id,
            self.read_range()
        );
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("valueRenderOption", "FORMATTED_VALUE"),
                ("dateTimeRenderOption", "FORMATTED_STRING"),
            ])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SheetcastError::Network {
                service: "sheets".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| SheetcastError::Network {
            service: "sheets".into(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(map_error(status, &body));
        }

        let range: ValueRange = serde_json::from_str(&body)?;
        Ok(range.values)
    }

    /// One POST to the `:clear` endpoint for the given row.
    async fn clear_once(&self, row_number: u32) -> Result<()> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}:clear",
            self.base_url,
            self.spreadsheet_id,
            self.clear_range(row_number)
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SheetcastError::Network {
                service: "sheets".into(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_error(status, &body));
        }
        Ok(())
    }
}

#[async_trait]
impl RowSource for SheetsClient {
    /// Fetch the working range and filter it down to eligible rows, retrying
    /// transient HTTP failures with backoff.
    async fn fetch_rows(&self) -> Result<Vec<Row>> {
        let values = retry_call("sheets.fetch", MAX_ATTEMPTS, &self.backoff, || {
            self.fetch_values_once()
        })
        .await?;
        let rows = filter_rows(&values);
        tracing::info!(
            count = rows.len(),
            row_numbers = ?rows.iter().map(|r| r.row_number).collect::<Vec<_>>(),
            "Filtered eligible rows"
        );
        Ok(rows)
    }

    async fn clear_row(&self, row_number: u32) -> Result<()> {
        retry_call("sheets.clear", MAX_ATTEMPTS, &self.backoff, || {
            self.clear_once(row_number)
        })
        .await?;
        tracing::info!(row_number, "Cleared row");
        Ok(())
    }
}

/// Map a non-2xx Sheets response to an error. 429, 500, and 503 are the
/// transient statuses worth retrying.
fn map_error(status: reqwest::StatusCode, body: &str) -> SheetcastError {
    let status_u16 = status.as_u16();
    SheetcastError::Api {
        service: "sheets".into(),
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
