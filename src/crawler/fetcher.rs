//! HTTP fetcher implementation
//!
//! This module handles the single request made for each URL:
//! - Building the HTTP client with a browser user agent and a hard timeout
//! - GET requests with outcome classification
//! - Streaming the body to an artifact file, raw or through the text extractor
//!
//! There are no retries. A failed URL leaves no artifact behind, so a later
//! run picks it up again. The one exception is text mode, where text read
//! before a broken body is kept.

use crate::config::{DownloadConfig, PersistMode};
use crate::extract::TextExtractor;
use crate::output::ProgressCode;
use crate::storage::ArtifactStore;
use bytes::Bytes;
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

/// Body chunks buffered between the network and the extractor thread
const EXTRACT_CHANNEL_DEPTH: usize = 16;

/// Result of visiting one URL
#[derive(Debug)]
pub enum VisitOutcome {
    /// Body (raw or extracted) stored in the artifact file
    Saved {
        /// HTTP status code (2xx or 404)
        status_code: u16,
        /// Artifact path
        path: PathBuf,
        /// Bytes written
        bytes: u64,
    },

    /// Extraction found no qualifying text; nothing stored
    Empty {
        /// HTTP status code
        status_code: u16,
    },

    /// Status other than 2xx or 404; nothing stored
    BadStatus {
        /// HTTP status code
        status_code: u16,
    },

    /// Request exceeded the configured timeout
    Timeout,

    /// Connection, DNS, TLS or protocol failure
    Transport {
        /// Error description
        error: String,
    },

    /// The URL could not be turned into a request
    InvalidRequest {
        /// Error description
        error: String,
    },

    /// Headers arrived but the body could not be read
    BodyError {
        /// Error description
        error: String,
    },

    /// The artifact file could not be created or written
    CreateFailed {
        /// Artifact path
        path: PathBuf,
        /// Error description
        error: String,
    },
}

impl VisitOutcome {
    /// Progress code reported for this outcome
    pub fn progress_code(&self) -> ProgressCode {
        match self {
            Self::Saved { status_code, .. } if *status_code == StatusCode::NOT_FOUND.as_u16() => {
                ProgressCode::NotFoundSaved
            }
            Self::Saved { .. } => ProgressCode::Saved,
            Self::Empty { .. } => ProgressCode::Empty,
            Self::BadStatus { .. } => ProgressCode::Status,
            Self::Timeout => ProgressCode::Timeout,
            Self::Transport { .. } => ProgressCode::Transport,
            Self::InvalidRequest { .. } => ProgressCode::Request,
            Self::BodyError { .. } => ProgressCode::Body,
            Self::CreateFailed { .. } => ProgressCode::Create,
        }
    }

    /// Returns true if a 2xx body was stored
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved { status_code, .. } if (200..300).contains(status_code))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The download configuration (user agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use url_harvest::config::DownloadConfig;
/// use url_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&DownloadConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &DownloadConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .pool_idle_timeout(config.timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches URLs and stores their bodies
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    store: ArtifactStore,
    persist: PersistMode,
    min_length: usize,
}

impl Fetcher {
    /// Creates a fetcher writing into `store`
    pub fn new(config: &DownloadConfig, store: ArtifactStore) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            store,
            persist: config.persist,
            min_length: config.min_length,
        })
    }

    pub fn persist_mode(&self) -> PersistMode {
        self.persist
    }

    /// Fetches one URL and persists its body when eligible
    ///
    /// # Outcome Classification
    ///
    /// | Condition | Outcome |
    /// |-----------|---------|
    /// | Invalid URL | InvalidRequest |
    /// | Timeout | Timeout |
    /// | Other request failure | Transport |
    /// | HTTP 2xx | Saved (or Empty in text mode) |
    /// | HTTP 404 | Saved (or Empty in text mode) |
    /// | Other status | BadStatus |
    pub async fn visit(&self, url: &str) -> VisitOutcome {
        let target = match Url::parse(url) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!("Invalid URL {}: {}", url, e);
                return VisitOutcome::InvalidRequest {
                    error: e.to_string(),
                };
            }
        };

        let response = match self.client.get(target).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(url, e),
        };

        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            tracing::debug!("Skipping {}: HTTP {}", url, status.as_u16());
            return VisitOutcome::BadStatus {
                status_code: status.as_u16(),
            };
        }

        let path = self.store.path_for_url(url);
        match self.persist {
            PersistMode::Raw => save_raw(url, response, &path).await,
            PersistMode::Text => save_text(url, response, &path, self.min_length).await,
        }
    }
}

/// Maps a failed `send` to an outcome
fn classify_request_error(url: &str, e: reqwest::Error) -> VisitOutcome {
    if e.is_timeout() {
        tracing::debug!("Timeout fetching {}", url);
        VisitOutcome::Timeout
    } else if e.is_builder() {
        tracing::debug!("Cannot build request for {}: {}", url, e);
        VisitOutcome::InvalidRequest {
            error: e.to_string(),
        }
    } else {
        tracing::debug!("Transport error for {}: {}", url, e);
        VisitOutcome::Transport {
            error: e.to_string(),
        }
    }
}

/// Streams the response body into the artifact file
///
/// A body that fails midway removes the partial file, so the URL is fetched
/// again on the next run.
async fn save_raw(url: &str, mut response: Response, path: &Path) -> VisitOutcome {
    let status_code = response.status().as_u16();

    let mut file = match tokio::fs::File::create(path).await {
        Ok(file) => file,
        Err(e) => return create_failed(url, path, e),
    };

    let mut bytes = 0u64;
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if let Err(e) = file.write_all(&chunk).await {
                    discard_partial(path).await;
                    return create_failed(url, path, e);
                }
                bytes += chunk.len() as u64;
            }
            Ok(None) => break,
            Err(e) => {
                discard_partial(path).await;
                return classify_body_error(url, e);
            }
        }
    }

    if let Err(e) = file.flush().await {
        discard_partial(path).await;
        return create_failed(url, path, e);
    }

    VisitOutcome::Saved {
        status_code,
        path: path.to_path_buf(),
        bytes,
    }
}

/// Runs the response body through the text extractor and stores the result
///
/// The tokenizer is not `Send`, so extraction runs on a blocking thread fed
/// chunk by chunk over a bounded channel. A body that fails midway ends the
/// document early; text captured up to that point is still stored, but the
/// outcome is the body failure so the URL is not recorded as parsed. Empty
/// text stores nothing.
async fn save_text(
    url: &str,
    mut response: Response,
    path: &Path,
    min_length: usize,
) -> VisitOutcome {
    let status_code = response.status().as_u16();

    let (tx, mut rx) = tokio::sync::mpsc::channel::<Bytes>(EXTRACT_CHANNEL_DEPTH);
    let extraction = tokio::task::spawn_blocking(move || {
        let mut extractor = TextExtractor::new(min_length);
        while let Some(chunk) = rx.blocking_recv() {
            extractor.feed(&chunk);
        }
        extractor.finish()
    });

    let mut body_error = None;
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Body of {} cut short: {}", url, e);
                body_error = Some(e);
                break;
            }
        }
    }
    drop(tx);

    let text = match extraction.await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Text extraction for {} failed: {}", url, e);
            return VisitOutcome::BodyError {
                error: e.to_string(),
            };
        }
    };

    if text.is_empty() {
        return match body_error {
            Some(e) => classify_body_error(url, e),
            None => {
                tracing::debug!("No text extracted from {}", url);
                VisitOutcome::Empty { status_code }
            }
        };
    }

    if let Err(e) = tokio::fs::write(path, text.as_bytes()).await {
        return create_failed(url, path, e);
    }

    // Partial text is kept on disk but the fetch still counts as failed
    if let Some(e) = body_error {
        return classify_body_error(url, e);
    }

    VisitOutcome::Saved {
        status_code,
        path: path.to_path_buf(),
        bytes: text.len() as u64,
    }
}

fn classify_body_error(url: &str, e: reqwest::Error) -> VisitOutcome {
    if e.is_timeout() {
        tracing::debug!("Timeout reading body of {}", url);
        VisitOutcome::Timeout
    } else {
        tracing::debug!("Failed reading body of {}: {}", url, e);
        VisitOutcome::BodyError {
            error: e.to_string(),
        }
    }
}

fn create_failed(url: &str, path: &Path, e: std::io::Error) -> VisitOutcome {
    tracing::warn!("Cannot write {} for {}: {}", path.display(), url, e);
    VisitOutcome::CreateFailed {
        path: path.to_path_buf(),
        error: e.to_string(),
    }
}

async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!("Could not remove partial file {}: {}", path.display(), e);
    }
}
