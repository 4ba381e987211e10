//! Download coordinator - main run orchestration logic
//!
//! This module contains the download loop that ties the pieces together:
//! - Validating the checkpoint ledger against the input on resume
//! - Scanning the URL list in order and recording each line in the ledger
//! - Skipping URLs whose artifact already exists
//! - Dispatching fetches into the worker pool
//! - Waiting for every in-flight fetch before reporting the run

use crate::config::{validate_download, DownloadConfig, PersistMode};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pool::WorkerPool;
use crate::output::{DownloadSummary, MilestoneClock, ProgressReporter, RunStats};
use crate::storage::{validate_prefix, ArtifactStore, CheckpointLedger, LossyLines};
use crate::HarvestError;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

/// Main download coordinator structure
pub struct Coordinator {
    config: DownloadConfig,
    store: ArtifactStore,
    fetcher: Arc<Fetcher>,
    parsed: Option<Arc<CheckpointLedger>>,
    pool: WorkerPool,
    stats: Arc<RunStats>,
    reporter: Arc<dyn ProgressReporter>,
    summary: DownloadSummary,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Creates the output directory, builds the HTTP client and, in text mode,
    /// opens the parsed ledger.
    ///
    /// # Arguments
    ///
    /// * `config` - The download configuration
    /// * `reporter` - Receiver of progress events
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - Failed to initialize
    pub fn new(
        config: DownloadConfig,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<Self, HarvestError> {
        let store = ArtifactStore::open(&config.outdir).map_err(|source| {
            HarvestError::OutputFile {
                path: config.outdir.display().to_string(),
                source,
            }
        })?;

        let parsed = match config.persist {
            PersistMode::Text => Some(Arc::new(CheckpointLedger::open(&config.parsedfile)?)),
            PersistMode::Raw => None,
        };

        let fetcher = Arc::new(Fetcher::new(&config, store.clone())?);
        let pool = WorkerPool::new(config.max_concurrent_downloads);

        Ok(Self {
            config,
            store,
            fetcher,
            parsed,
            pool,
            stats: Arc::new(RunStats::new()),
            reporter,
            summary: DownloadSummary::default(),
        })
    }

    /// Runs the download
    ///
    /// 1. Opens the input list
    /// 2. Validates the checkpoint ledger against the head of the input
    /// 3. Re-dispatches missing artifacts of the validated prefix (if enabled)
    /// 4. Scans the rest of the input, appending every line to the ledger
    /// 5. Waits for all fetches to finish
    ///
    /// Any error returned here is fatal for the run. Misalignment is detected
    /// before the first fetch is dispatched.
    pub async fn run(mut self) -> Result<DownloadSummary, HarvestError> {
        let mut clock = MilestoneClock::start();

        let input = File::open(&self.config.infile).map_err(|source| HarvestError::InputFile {
            path: self.config.infile.display().to_string(),
            source,
        })?;
        let mut lines = LossyLines::new(BufReader::new(input));

        let mut missing = Vec::new();
        let resumed = validate_prefix(&self.config.checkfile, &mut lines, |url| {
            if self.config.retry_missing && !url.is_empty() && !self.store.contains_url(url) {
                missing.push(url.to_string());
            }
        })?;
        self.summary.resumed = resumed;
        if resumed > 0 {
            tracing::info!(
                "Resuming: {} lines already checked in {}",
                resumed,
                self.config.checkfile.display()
            );
        }
        self.reporter.on_resume(resumed);

        let ledger = CheckpointLedger::open(&self.config.checkfile)?;

        let scan_result = self.scan(missing, &mut lines, &ledger, &mut clock).await;

        // Nothing counts as done until every in-flight fetch has returned
        self.pool.drain().await;
        ledger.flush()?;
        if let Some(parsed) = &self.parsed {
            parsed.flush()?;
        }
        scan_result?;

        self.summary.peak_in_flight = self.pool.peak_in_flight();
        self.summary.outcomes = self.stats.snapshot();
        self.summary.elapsed = clock.elapsed();
        Ok(self.summary)
    }

    /// Dispatches retries, then walks the remaining input lines
    async fn scan(
        &mut self,
        missing: Vec<String>,
        lines: &mut LossyLines<BufReader<File>>,
        ledger: &CheckpointLedger,
        clock: &mut MilestoneClock,
    ) -> Result<(), HarvestError> {
        if !missing.is_empty() {
            tracing::info!("Retrying {} checked urls without artifact", missing.len());
        }
        for url in missing {
            self.dispatch(url).await?;
        }

        for line in lines {
            let line = line.map_err(|source| HarvestError::InputFile {
                path: self.config.infile.display().to_string(),
                source,
            })?;
            let url = line.trim();

            // Every scanned line goes to the ledger to keep it aligned with the input
            ledger.append(url)?;
            clock.tick(self.summary.scanned, self.reporter.as_ref());
            self.summary.scanned += 1;

            if url.is_empty() {
                self.summary.blank += 1;
                continue;
            }
            if self.store.contains_url(url) {
                self.summary.skipped_existing += 1;
                continue;
            }

            self.dispatch(url.to_string()).await?;
        }

        Ok(())
    }

    /// Waits for a pool token and spawns the fetch for `url`
    async fn dispatch(&mut self, url: String) -> Result<(), HarvestError> {
        let fetcher = Arc::clone(&self.fetcher);
        let parsed = self.parsed.clone();
        let stats = Arc::clone(&self.stats);
        let reporter = Arc::clone(&self.reporter);

        self.pool
            .spawn(async move {
                let outcome = fetcher.visit(&url).await;
                if outcome.is_success() {
                    if let Some(parsed) = &parsed {
                        if let Err(e) = parsed.append(&url) {
                            tracing::error!("Cannot record {} as parsed: {}", url, e);
                        }
                    }
                }
                let code = outcome.progress_code();
                stats.record(code);
                reporter.on_progress(code);
            })
            .await?;

        self.summary.dispatched += 1;
        Ok(())
    }
}

/// Runs a complete download
///
/// This is the main entry point for the `download` command.
///
/// # Arguments
///
/// * `config` - The download configuration
/// * `reporter` - Receiver of progress events
///
/// # Returns
///
/// * `Ok(DownloadSummary)` - Run finished; per-URL failures are in the summary
/// * `Err(HarvestError)` - Setup failed or the checkpoint does not match the input
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use url_harvest::config::DownloadConfig;
/// use url_harvest::crawler::run_download;
/// use url_harvest::output::ConsoleReporter;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_download(DownloadConfig::default(), Arc::new(ConsoleReporter)).await?;
/// println!("{} saved", summary.outcomes.saved);
/// # Ok(())
/// # }
/// ```
pub async fn run_download(
    config: DownloadConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<DownloadSummary, HarvestError> {
    validate_download(&config)?;
    tracing::info!(
        "Downloading {} into {} ({} workers, {} mode)",
        config.infile.display(),
        config.outdir.display(),
        config.max_concurrent_downloads,
        config.persist
    );
    Coordinator::new(config, reporter)?.run().await
}
