//! Row source adapter backed by the Sheets v4 values API.
//!
//! The spreadsheet is the durable source of truth for pending posts: this
//! crate fetches the working range, filters it down to eligible rows, and
//! clears a row once it has been published everywhere.

pub mod auth;
pub mod client;
pub mod rows;

pub use auth::load_access_token;
pub use client::SheetsClient;
pub use rows::filter_rows;
