//! url-harvest: a resumable bulk URL fetcher and HTML text extractor
//!
//! This crate downloads large URL lists with a bounded worker pool, keeps an
//! append-only checkpoint ledger so interrupted runs can resume, and reduces
//! stored HTML into plain text with a streaming tokenizer.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for url-harvest operations
///
/// Only setup failures surface as `HarvestError`. Failures tied to a single
/// URL are reported as [`crawler::VisitOutcome`] values instead.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Ledger(#[from] storage::LedgerError),

    #[error("Cannot open input file {path}: {source}")]
    InputFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot prepare output {path}: {source}")]
    OutputFile {
        path: String,
        source: std::io::Error,
    },

    #[error("Worker pool closed: {0}")]
    PoolClosed(#[from] tokio::sync::AcquireError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for url-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{DownloadConfig, ExtractConfig, PersistMode};
pub use crawler::{run_batch_extract, run_download, VisitOutcome};
pub use extract::{extract_text, TextExtractor};
pub use crate::url::url_to_filename;
