//! Storage module for run state on disk
//!
//! This module handles:
//! - Artifact files, one per URL, whose presence marks a URL as done
//! - Append-only ledgers of scanned and extracted URLs
//! - Validation of a checkpoint ledger against the input on resume

mod artifact;
mod ledger;
mod lines;

pub use artifact::ArtifactStore;
pub use ledger::{validate_prefix, CheckpointLedger, LedgerError, LedgerResult};
pub use lines::LossyLines;
