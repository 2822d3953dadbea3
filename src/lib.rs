pub mod app;
pub mod browser;
pub mod config;
pub mod constants;
pub mod error;
pub mod infra;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod types;

pub use error::{Result, ScraperError};
pub use types::{CollectionResult, Extraction, Price, Record, SelectorSet, SkipReason};
