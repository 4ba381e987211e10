//! Run statistics
//!
//! Outcome tallies are shared between worker tasks, so they are kept in
//! atomic counters and read back as a plain [`OutcomeCounts`] snapshot.

use crate::output::progress::ProgressCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Thread-safe per-outcome counters
#[derive(Debug, Default)]
pub struct RunStats {
    saved: AtomicUsize,
    not_found_saved: AtomicUsize,
    status: AtomicUsize,
    timeout: AtomicUsize,
    transport: AtomicUsize,
    request: AtomicUsize,
    body: AtomicUsize,
    create: AtomicUsize,
    empty: AtomicUsize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one outcome
    pub fn record(&self, code: ProgressCode) {
        let counter = match code {
            ProgressCode::Saved => &self.saved,
            ProgressCode::NotFoundSaved => &self.not_found_saved,
            ProgressCode::Status => &self.status,
            ProgressCode::Timeout => &self.timeout,
            ProgressCode::Transport => &self.transport,
            ProgressCode::Request => &self.request,
            ProgressCode::Body => &self.body,
            ProgressCode::Create => &self.create,
            ProgressCode::Empty => &self.empty,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Current values of all counters
    pub fn snapshot(&self) -> OutcomeCounts {
        OutcomeCounts {
            saved: self.saved.load(Ordering::Relaxed),
            not_found_saved: self.not_found_saved.load(Ordering::Relaxed),
            status: self.status.load(Ordering::Relaxed),
            timeout: self.timeout.load(Ordering::Relaxed),
            transport: self.transport.load(Ordering::Relaxed),
            request: self.request.load(Ordering::Relaxed),
            body: self.body.load(Ordering::Relaxed),
            create: self.create.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
        }
    }
}

/// Outcome tallies of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub saved: usize,
    pub not_found_saved: usize,
    pub status: usize,
    pub timeout: usize,
    pub transport: usize,
    pub request: usize,
    pub body: usize,
    pub create: usize,
    pub empty: usize,
}

impl OutcomeCounts {
    /// Outcomes that wrote an artifact
    pub fn persisted(&self) -> usize {
        self.saved + self.not_found_saved
    }

    /// Outcomes that wrote nothing because something went wrong
    pub fn failed(&self) -> usize {
        self.status + self.timeout + self.transport + self.request + self.body + self.create
    }

    /// Every recorded outcome
    pub fn total(&self) -> usize {
        self.persisted() + self.failed() + self.empty
    }
}

/// Summary of a `download` run
#[derive(Debug, Clone, Default)]
pub struct DownloadSummary {
    /// Input lines covered by the validated checkpoint prefix
    pub resumed: usize,

    /// Input lines scanned after the prefix
    pub scanned: usize,

    /// Lines skipped because their artifact already existed
    pub skipped_existing: usize,

    /// Blank input lines
    pub blank: usize,

    /// Fetches handed to the worker pool
    pub dispatched: usize,

    /// Highest number of fetches in flight at once
    pub peak_in_flight: usize,

    pub outcomes: OutcomeCounts,

    pub elapsed: Duration,
}

/// Summary of an `extract` batch run
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Lines read from the list file
    pub scanned: usize,

    /// Blank lines in the list file
    pub blank: usize,

    /// Files with text written to the output directory
    pub written: usize,

    /// Files that produced no qualifying text
    pub empty: usize,

    /// Files that could not be opened
    pub missing: usize,

    /// Files whose read stopped early with an error
    pub interrupted: usize,

    /// Output files that could not be written
    pub write_failed: usize,

    pub elapsed: Duration,
}

/// Logs a download summary at info level
pub fn log_download_summary(summary: &DownloadSummary) {
    let outcomes = &summary.outcomes;
    tracing::info!(
        "Download finished in {:?}: {} resumed, {} scanned, {} already present, {} dispatched (peak {} in flight)",
        summary.elapsed,
        summary.resumed,
        summary.scanned,
        summary.skipped_existing,
        summary.dispatched,
        summary.peak_in_flight
    );
    tracing::info!(
        "Outcomes: {} saved, {} not found, {} bad status, {} timeouts, {} transport errors, {} bad requests, {} body errors, {} write errors, {} empty",
        outcomes.saved,
        outcomes.not_found_saved,
        outcomes.status,
        outcomes.timeout,
        outcomes.transport,
        outcomes.request,
        outcomes.body,
        outcomes.create,
        outcomes.empty
    );
}

/// Logs a batch extraction summary at info level
pub fn log_batch_summary(summary: &BatchSummary) {
    tracing::info!(
        "Extraction finished in {:?}: {} lines scanned ({} blank), {} written, {} empty, {} missing, {} interrupted, {} write errors",
        summary.elapsed,
        summary.scanned,
        summary.blank,
        summary.written,
        summary.empty,
        summary.missing,
        summary.interrupted,
        summary.write_failed
    );
}
