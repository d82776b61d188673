//! Per-partition accounting for one export run.
//!
//! Purely observational; nothing here feeds back into the pipeline.

use std::collections::BTreeMap;

use tracing::{info, warn};

/// Counters for one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionCounts {
    /// Records that produced both output files.
    pub completed: u64,
    /// Records dropped because asset storage refused the download.
    pub skipped: u64,
    /// Records that failed an enrichment or I/O step.
    pub failed: u64,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    partitions: BTreeMap<u16, PartitionCounts>,
    fetch_failures: BTreeMap<u16, String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completed(&mut self, year: u16) {
        self.partitions.entry(year).or_default().completed += 1;
    }

    pub fn record_skipped(&mut self, year: u16) {
        self.partitions.entry(year).or_default().skipped += 1;
    }

    pub fn record_failed(&mut self, year: u16) {
        self.partitions.entry(year).or_default().failed += 1;
    }

    /// The partition's pagination aborted; records already emitted before
    /// the failure are still counted under their outcome.
    pub fn record_fetch_failure(&mut self, year: u16, error: String) {
        self.fetch_failures.insert(year, error);
    }

    pub fn counts(&self, year: u16) -> PartitionCounts {
        self.partitions.get(&year).copied().unwrap_or_default()
    }

    pub fn fetch_failure(&self, year: u16) -> Option<&str> {
        self.fetch_failures.get(&year).map(String::as_str)
    }

    /// True when any record or partition fetch failed.
    pub fn has_failures(&self) -> bool {
        !self.fetch_failures.is_empty()
            || self.partitions.values().any(|counts| counts.failed > 0)
    }

    /// One line per partition, at the end of the run.
    pub fn log(&self) {
        for (year, counts) in &self.partitions {
            info!(
                year,
                completed = counts.completed,
                skipped = counts.skipped,
                failed = counts.failed,
                "Done with {} tracks from {}",
                counts.completed,
                year
            );
        }
        for (year, error) in &self.fetch_failures {
            warn!(year, error = %error, "Partition fetch aborted");
        }
    }
}
