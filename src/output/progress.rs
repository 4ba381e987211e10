//! Progress reporting interface
//!
//! Workers report one [`ProgressCode`] per fetched URL, and the drivers report
//! a [`Milestone`] every [`MILESTONE_INTERVAL`] scanned lines. Reporters decide
//! where that goes: the console in the binary, memory in tests.

use std::fmt;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Number of scanned lines between two milestones
pub const MILESTONE_INTERVAL: usize = 1000;

/// Single-character outcome code for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressCode {
    /// Body stored (2xx)
    Saved,
    /// Body of a 404 stored
    NotFoundSaved,
    /// Status other than 2xx or 404; nothing stored
    Status,
    /// Request timed out
    Timeout,
    /// Transport-level failure (DNS, connect, TLS, ...)
    Transport,
    /// Request could not be built (invalid URL)
    Request,
    /// Response body could not be read
    Body,
    /// Artifact file could not be created or written
    Create,
    /// No qualifying text; nothing stored
    Empty,
}

impl ProgressCode {
    /// The character printed for this outcome
    pub fn as_char(&self) -> char {
        match self {
            Self::Saved => '.',
            Self::NotFoundSaved => '4',
            Self::Status => 'S',
            Self::Timeout => 'T',
            Self::Transport => 'F',
            Self::Request => 'R',
            Self::Body => 'E',
            Self::Create => 'C',
            Self::Empty => '_',
        }
    }

    /// Returns true if an artifact was written for this outcome
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Saved | Self::NotFoundSaved)
    }
}

impl fmt::Display for ProgressCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Periodic throughput report
#[derive(Debug, Clone, PartialEq)]
pub struct Milestone {
    /// Lines scanned so far in this run
    pub scanned: usize,
    /// Time since the previous milestone
    pub since_last: Duration,
    /// Time since the run started
    pub total: Duration,
}

/// Receives progress events from a run
///
/// Implementations must be cheap and must not block for long; `on_progress`
/// is called from worker tasks.
pub trait ProgressReporter: Send + Sync {
    /// Called once per fetched URL (or per processed file in batch mode)
    fn on_progress(&self, code: ProgressCode);

    /// Called every [`MILESTONE_INTERVAL`] scanned lines, starting at zero
    fn on_milestone(&self, milestone: &Milestone);

    /// Called once when a resumed run skips its checkpointed prefix
    fn on_resume(&self, skipped: usize) {
        let _ = skipped;
    }
}

/// Writes the progress stream to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_progress(&self, code: ProgressCode) {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "{}", code.as_char());
        let _ = stdout.flush();
    }

    fn on_milestone(&self, milestone: &Milestone) {
        println!(
            "\nScanned {} urls in {:?} (total : {:?})",
            milestone.scanned, milestone.since_last, milestone.total
        );
    }

    fn on_resume(&self, skipped: usize) {
        println!("Skipped {} already checked urls", skipped);
    }
}

/// Records every event in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    codes: Mutex<Vec<ProgressCode>>,
    milestones: Mutex<Vec<Milestone>>,
    resumed: Mutex<Option<usize>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress codes in the order they were reported
    pub fn codes(&self) -> Vec<ProgressCode> {
        self.codes.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of times `code` was reported
    pub fn count(&self, code: ProgressCode) -> usize {
        self.codes().iter().filter(|c| **c == code).count()
    }

    pub fn milestones(&self) -> Vec<Milestone> {
        self.milestones.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Prefix length passed to `on_resume`, if it was called
    pub fn resumed(&self) -> Option<usize> {
        self.resumed.lock().map(|r| *r).unwrap_or_default()
    }
}

impl ProgressReporter for MemoryReporter {
    fn on_progress(&self, code: ProgressCode) {
        if let Ok(mut codes) = self.codes.lock() {
            codes.push(code);
        }
    }

    fn on_milestone(&self, milestone: &Milestone) {
        if let Ok(mut milestones) = self.milestones.lock() {
            milestones.push(milestone.clone());
        }
    }

    fn on_resume(&self, skipped: usize) {
        if let Ok(mut resumed) = self.resumed.lock() {
            *resumed = Some(skipped);
        }
    }
}
