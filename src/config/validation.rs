use crate::config::types::{DownloadConfig, ExtractConfig};
use crate::ConfigError;
use std::path::Path;

/// Upper bound on the worker pool size
pub const MAX_CONCURRENT_DOWNLOADS: usize = 1000;

/// Validates the settings of the `download` command
pub fn validate_download(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_downloads < 1
        || config.max_concurrent_downloads > MAX_CONCURRENT_DOWNLOADS
    {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-downloads must be between 1 and {}, got {}",
            MAX_CONCURRENT_DOWNLOADS, config.max_concurrent_downloads
        )));
    }

    if config.timeout.as_secs() < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be at least 1 second, got {:?}",
            config.timeout
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    validate_path("outdir", &config.outdir)?;
    validate_path("infile", &config.infile)?;
    validate_path("checkfile", &config.checkfile)?;
    validate_path("parsedfile", &config.parsedfile)?;

    Ok(())
}

/// Validates the settings of the `extract` command
pub fn validate_extract(config: &ExtractConfig) -> Result<(), ConfigError> {
    validate_path("listfile", &config.listfile)?;
    validate_path("datadir", &config.datadir)?;
    validate_path("outdir", &config.outdir)?;
    validate_path("outfile", &config.outfile)?;
    Ok(())
}

fn validate_path(name: &str, path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    Ok(())
}
