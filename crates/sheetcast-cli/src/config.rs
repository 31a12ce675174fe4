//! Runtime configuration, sourced from the environment (optionally via a
//! `.env` file). Every setting is required; startup aborts with the full
//! list of missing variables rather than failing on the first one.

use std::path::PathBuf;

use sheetcast_types::{Result, SheetcastError};

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials_path: PathBuf,
    pub gemini_api_key: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub instagram_account_id: String,
    pub instagram_access_token: String,
    pub facebook_page_id: String,
    pub facebook_access_token: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup. Split out from
    /// [`from_env`](Config::from_env) so tests do not race on process-global
    /// environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut missing = Vec::new();
        let mut get = |name: &'static str| match lookup(name).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => {
                missing.push(name);
                String::new()
            }
        };

        let config = Self {
            credentials_path: PathBuf::from(get("GOOGLE_CREDENTIALS_PATH")),
            gemini_api_key: get("GEMINI_API_KEY"),
            spreadsheet_id: get("SPREADSHEET_ID"),
            sheet_name: get("SHEET_NAME"),
            instagram_account_id: get("INSTAGRAM_ACCOUNT_ID"),
            instagram_access_token: get("INSTAGRAM_ACCESS_TOKEN"),
            facebook_page_id: get("FACEBOOK_PAGE_ID"),
            facebook_access_token: get("FACEBOOK_ACCESS_TOKEN"),
        };

        if missing.is_empty() {
            Ok(config)
        } else {
            Err(SheetcastError::Config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )))
        }
    }
}
