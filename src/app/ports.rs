use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::Result;
use crate::types::Record;

/// Persists the final, deduplicated records of a run
#[async_trait]
pub trait ExportPort: Send + Sync {
    /// Write `records` for `search_term`, returning where they went.
    /// Must not be called with an empty slice.
    async fn export(&self, search_term: &str, records: &[Record]) -> Result<PathBuf>;
}
