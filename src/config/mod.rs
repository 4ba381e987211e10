//! Configuration module for url-harvest
//!
//! Settings come from command-line flags, an optional TOML file and built-in
//! defaults, in that order of precedence.
//!
//! # Example
//!
//! ```no_run
//! use url_harvest::config::{load_config, resolve_download, DownloadSection};
//! use std::path::Path;
//!
//! let file = load_config(Path::new("harvest.toml")).unwrap();
//! let config = resolve_download(DownloadSection::default(), Some(&file)).unwrap();
//! println!("Worker pool size: {}", config.max_concurrent_downloads);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ConfigFile, DownloadConfig, DownloadSection, ExtractConfig, ExtractSection, PersistMode,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{load_config, resolve_download, resolve_extract};
pub use validation::{validate_download, validate_extract, MAX_CONCURRENT_DOWNLOADS};
