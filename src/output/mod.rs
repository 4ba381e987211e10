//! Output module for progress and run reporting
//!
//! This module handles:
//! - The per-URL progress code stream and periodic milestones
//! - Outcome counters shared across workers
//! - End-of-run summaries

pub mod progress;
pub mod stats;

pub use progress::{
    ConsoleReporter, MemoryReporter, Milestone, ProgressCode, ProgressReporter,
    MILESTONE_INTERVAL,
};
pub use stats::{
    log_batch_summary, log_download_summary, BatchSummary, DownloadSummary, OutcomeCounts,
    RunStats,
};

use std::time::Instant;

/// Tracks when milestones are due and how long each interval took
#[derive(Debug)]
pub struct MilestoneClock {
    start: Instant,
    last: Instant,
}

impl MilestoneClock {
    pub fn start() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    /// Emits a milestone when `scanned` is a multiple of [`MILESTONE_INTERVAL`]
    ///
    /// `scanned` is the count of lines seen before the current one, so the
    /// first milestone fires on the first line.
    pub fn tick(&mut self, scanned: usize, reporter: &dyn ProgressReporter) {
        if scanned % MILESTONE_INTERVAL != 0 {
            return;
        }
        let now = Instant::now();
        let milestone = Milestone {
            scanned,
            since_last: now - self.last,
            total: now - self.start,
        };
        tracing::debug!(
            "Scanned {} lines in {:?} (total {:?})",
            milestone.scanned,
            milestone.since_last,
            milestone.total
        );
        reporter.on_milestone(&milestone);
        self.last = now;
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
