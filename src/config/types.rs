use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Browser user agent sent with every request
///
/// Some origin servers reject default library agent strings.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.77 Safari/537.36";

/// How fetched bodies are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Store the response bytes unchanged
    #[default]
    Raw,
    /// Store the extracted body text
    Text,
}

impl fmt::Display for PersistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Text => write!(f, "text"),
        }
    }
}

impl FromStr for PersistMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown persist mode '{}', expected raw or text", other)),
        }
    }
}

/// Settings for the `download` command
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Maximum number of fetches in flight at once
    pub max_concurrent_downloads: usize,

    /// Directory receiving one artifact per URL
    pub outdir: PathBuf,

    /// Input URL list, one URL per line
    pub infile: PathBuf,

    /// Checkpoint ledger of scanned URLs, aligned with `infile`
    pub checkfile: PathBuf,

    /// Ledger of URLs whose text was extracted and stored (text mode)
    pub parsedfile: PathBuf,

    /// Per-request timeout
    pub timeout: Duration,

    /// Minimum length (exclusive) of captured text fragments
    pub min_length: usize,

    /// Whether bodies are stored raw or as extracted text
    pub persist: PersistMode,

    /// Re-fetch URLs in the checkpointed prefix whose artifact is missing
    pub retry_missing: bool,

    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: 20,
            outdir: PathBuf::from("scraped"),
            infile: PathBuf::from("urls.txt"),
            checkfile: PathBuf::from("scraped.txt"),
            parsedfile: PathBuf::from("parsed.txt"),
            timeout: Duration::from_secs(30),
            min_length: crate::extract::DEFAULT_MIN_LENGTH,
            persist: PersistMode::Raw,
            retry_missing: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Settings for the `extract` command
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// File listing the artifact filenames to process, one per line
    pub listfile: PathBuf,

    /// Directory holding the downloaded artifacts
    pub datadir: PathBuf,

    /// Directory receiving the extracted text files
    pub outdir: PathBuf,

    /// File recording every processed filename
    pub outfile: PathBuf,

    /// Minimum length (exclusive) of captured text fragments
    pub min_length: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            listfile: PathBuf::from("scraped.txt"),
            datadir: PathBuf::from("scraped"),
            outdir: PathBuf::from("parsed"),
            outfile: PathBuf::from("parsed.txt"),
            min_length: crate::extract::DEFAULT_MIN_LENGTH,
        }
    }
}

/// Contents of an optional TOML configuration file
///
/// Every key is optional; missing keys fall back to command-line flags or
/// built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub download: DownloadSection,

    #[serde(default)]
    pub extract: ExtractSection,
}

/// `[download]` table of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DownloadSection {
    pub max_concurrent_downloads: Option<usize>,
    pub outdir: Option<PathBuf>,
    pub infile: Option<PathBuf>,
    pub checkfile: Option<PathBuf>,
    pub parsedfile: Option<PathBuf>,
    /// Timeout in seconds
    pub timeout: Option<u64>,
    pub min_length: Option<usize>,
    pub persist: Option<PersistMode>,
    pub retry_missing: Option<bool>,
    pub user_agent: Option<String>,
}

/// `[extract]` table of the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExtractSection {
    pub listfile: Option<PathBuf>,
    pub datadir: Option<PathBuf>,
    pub outdir: Option<PathBuf>,
    pub outfile: Option<PathBuf>,
    pub min_length: Option<usize>,
}
