#![forbid(unsafe_code)]
//! Upstream ingestion: a retrying HTTP fetch primitive and the two fetcher
//! families built on it (FRED JSON series, Indeed Hiring Lab CSVs).

mod client;
mod error;
mod fred;
mod indeed;

pub use client::{fetch_text, FetchPolicy};
pub use error::{FetchError, FetchErrorCode};
pub use fred::{fetch_fred_series, FRED_DEFAULT_BASE_URL};
pub use indeed::{fetch_indeed, INDEED_DEFAULT_BASE_URL};

pub const CRATE_NAME: &str = "macropulse-ingest";
