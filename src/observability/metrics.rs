//! Run counters recorded through the `metrics` facade.
//!
//! Nothing is recorded until [`install_recorder`] has run; before that every
//! call here is a no-op. The CLI installs it when `--metrics-file` is given and
//! writes the Prometheus text rendering there once the run ends.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{Result, ScraperError};
use crate::types::SkipReason;

pub const PAGES_VISITED: &str = "scraper_pages_visited_total";
pub const RECORDS_COLLECTED: &str = "scraper_records_collected_total";
pub const CARDS_SKIPPED: &str = "scraper_cards_skipped_total";
pub const DUPLICATES: &str = "scraper_duplicates_total";
pub const RUNS: &str = "scraper_runs_total";

/// Install the process-wide Prometheus recorder. Only the first call succeeds.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ScraperError::Metrics(e.to_string()))?;
    info!("Metrics recorder installed");
    Ok(handle)
}

/// Write the current counter values to `path` in Prometheus text format
pub fn write_snapshot(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, handle.render())?;
    info!("Wrote metrics to {}", path.display());
    Ok(())
}

pub mod traversal {
    use super::*;

    pub fn page_visited() {
        ::metrics::counter!(PAGES_VISITED).increment(1);
    }

    pub fn records_collected(count: usize) {
        ::metrics::counter!(RECORDS_COLLECTED).increment(count as u64);
    }

    pub fn card_skipped(reason: &SkipReason) {
        ::metrics::counter!(CARDS_SKIPPED, "reason" => reason.label()).increment(1);
    }

    pub fn duplicates_dropped(count: usize) {
        ::metrics::counter!(DUPLICATES).increment(count as u64);
    }

    /// Record how a run ended, e.g. "completed" or "fatal"
    pub fn run_finished(termination: &'static str) {
        ::metrics::counter!(RUNS, "termination" => termination).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_contains_recorded_counters() {
        let handle = install_recorder().unwrap();
        traversal::page_visited();
        traversal::card_skipped(&SkipReason::PriceNotFound);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics").join("run.prom");
        write_snapshot(&handle, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(PAGES_VISITED));
        assert!(text.contains("reason=\"price_not_found\""));

        // a second recorder cannot replace the first
        assert!(install_recorder().is_err());
    }
}
