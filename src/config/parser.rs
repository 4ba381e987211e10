use crate::config::types::{
    ConfigFile, DownloadConfig, DownloadSection, ExtractConfig, ExtractSection,
};
use crate::config::validation::{validate_download, validate_extract};
use crate::ConfigError;
use std::path::Path;
use std::time::Duration;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(ConfigFile)` - Successfully parsed configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use url_harvest::config::load_config;
///
/// let file = load_config(Path::new("harvest.toml")).unwrap();
/// println!("Timeout: {:?}", file.download.timeout);
/// ```
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config)
}

/// Builds the `download` settings from command-line values and an optional file
///
/// Values given on the command line win over the file, and the file wins over
/// built-in defaults. The result is validated.
pub fn resolve_download(
    cli: DownloadSection,
    file: Option<&ConfigFile>,
) -> Result<DownloadConfig, ConfigError> {
    let file = file.map(|f| f.download.clone()).unwrap_or_default();
    let defaults = DownloadConfig::default();

    let config = DownloadConfig {
        max_concurrent_downloads: cli
            .max_concurrent_downloads
            .or(file.max_concurrent_downloads)
            .unwrap_or(defaults.max_concurrent_downloads),
        outdir: cli.outdir.or(file.outdir).unwrap_or(defaults.outdir),
        infile: cli.infile.or(file.infile).unwrap_or(defaults.infile),
        checkfile: cli.checkfile.or(file.checkfile).unwrap_or(defaults.checkfile),
        parsedfile: cli
            .parsedfile
            .or(file.parsedfile)
            .unwrap_or(defaults.parsedfile),
        timeout: cli
            .timeout
            .or(file.timeout)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        min_length: cli
            .min_length
            .or(file.min_length)
            .unwrap_or(defaults.min_length),
        persist: cli.persist.or(file.persist).unwrap_or(defaults.persist),
        retry_missing: cli
            .retry_missing
            .or(file.retry_missing)
            .unwrap_or(defaults.retry_missing),
        user_agent: cli
            .user_agent
            .or(file.user_agent)
            .unwrap_or(defaults.user_agent),
    };

    validate_download(&config)?;
    Ok(config)
}

/// Builds the `extract` settings from command-line values and an optional file
pub fn resolve_extract(
    cli: ExtractSection,
    file: Option<&ConfigFile>,
) -> Result<ExtractConfig, ConfigError> {
    let file = file.map(|f| f.extract.clone()).unwrap_or_default();
    let defaults = ExtractConfig::default();

    let config = ExtractConfig {
        listfile: cli.listfile.or(file.listfile).unwrap_or(defaults.listfile),
        datadir: cli.datadir.or(file.datadir).unwrap_or(defaults.datadir),
        outdir: cli.outdir.or(file.outdir).unwrap_or(defaults.outdir),
        outfile: cli.outfile.or(file.outfile).unwrap_or(defaults.outfile),
        min_length: cli
            .min_length
            .or(file.min_length)
            .unwrap_or(defaults.min_length),
    };

    validate_extract(&config)?;
    Ok(config)
}
