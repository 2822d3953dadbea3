use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::app::ports::ExportPort;
use crate::browser::Browser;
use crate::pipeline::{Termination, TraversalController};
use crate::types::CollectionResult;

/// What happened to the collected records after traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Written(PathBuf),
    /// The run produced no records, so nothing was written
    NothingToExport,
    /// Export was turned off for this run
    Disabled,
    Failed(String),
}

/// Outcome of one collection run, ready to be reported
#[derive(Debug, Clone)]
pub struct CollectReport {
    pub search_term: String,
    pub result: CollectionResult,
    pub termination: Termination,
    pub export: ExportStatus,
}

impl CollectReport {
    /// A fatal traversal still counts as success when its partial results
    /// were persisted; only a failed write does not.
    pub fn is_success(&self) -> bool {
        !matches!(self.export, ExportStatus::Failed(_))
    }
}

impl fmt::Display for CollectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results for '{}':", self.search_term)?;
        writeln!(f, "   Records collected: {}", self.result.records.len())?;
        writeln!(f, "   Duplicates removed: {}", self.result.duplicates_removed)?;
        writeln!(f, "   Pages visited: {}", self.result.pages_visited)?;
        writeln!(f, "   Cards skipped: {}", self.result.cards_skipped)?;
        writeln!(f, "   Ended: {}", self.termination)?;
        match &self.export {
            ExportStatus::Written(path) => write!(f, "   Output file: {}", path.display()),
            ExportStatus::NothingToExport => write!(f, "   No records collected, nothing exported"),
            ExportStatus::Disabled => write!(f, "   Export disabled"),
            ExportStatus::Failed(e) => write!(f, "   Export FAILED: {}", e),
        }
    }
}

/// Runs a traversal to completion and hands its records to the export port
pub struct CollectUseCase {
    output: Option<Box<dyn ExportPort>>,
}

impl CollectUseCase {
    pub fn new(output: Box<dyn ExportPort>) -> Self {
        Self { output: Some(output) }
    }

    pub fn without_export() -> Self {
        Self { output: None }
    }

    pub async fn execute<B: Browser>(
        &self,
        controller: TraversalController<B>,
        search_term: &str,
    ) -> CollectReport {
        info!("Collecting listings for '{}'", search_term);
        let outcome = controller.run(search_term).await;

        if outcome.termination.is_fatal() {
            warn!(
                "Run ended early; keeping {} record(s) collected before the failure",
                outcome.result.records.len()
            );
        }

        let export = match &self.output {
            None => ExportStatus::Disabled,
            Some(_) if outcome.result.records.is_empty() => ExportStatus::NothingToExport,
            Some(output) => match output.export(search_term, &outcome.result.records).await {
                Ok(path) => ExportStatus::Written(path),
                Err(e) => {
                    error!("Export failed: {}", e);
                    ExportStatus::Failed(e.to_string())
                }
            },
        };

        CollectReport {
            search_term: search_term.to_string(),
            result: outcome.result,
            termination: outcome.termination,
            export,
        }
    }
}
