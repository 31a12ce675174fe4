//! Loading the Sheets bearer token from the credentials file.
//!
//! The credentials file either holds the token verbatim or a JSON object
//! with an `access_token` field (the shape written by
//! `gcloud auth print-access-token --format=json` style tooling).

use std::path::Path;

use sheetcast_types::{Result, SheetcastError};

/// Read the Sheets access token from `path`.
pub fn load_access_token(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SheetcastError::Config(format!(
            "cannot read credentials file {}: {e}",
            path.display()
        ))
    })?;
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(SheetcastError::Config(format!(
            "credentials file {} is empty",
            path.display()
        )));
    }

    if trimmed.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(trimmed).map_err(|e| {
            SheetcastError::Config(format!(
                "credentials file {} is not valid JSON: {e}",
                path.display()
            ))
        })?;
        return value["access_token"]
            .as_str()
            .filter(|t| !t.is_empty())
            .map(String::from)
            .ok_or_else(|| {
                SheetcastError::Config(format!(
                    "credentials file {} has no 'access_token' field",
                    path.display()
                ))
            });
    }

    Ok(trimmed.to_string())
}
