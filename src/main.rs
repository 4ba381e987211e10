//! url-harvest main entry point
//!
//! This is the command-line interface for the url-harvest bulk fetcher.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url_harvest::config::{
    load_config, resolve_download, resolve_extract, ConfigFile, DownloadSection, ExtractSection,
    PersistMode,
};
use url_harvest::crawler::{run_batch_extract, run_download};
use url_harvest::output::{log_batch_summary, log_download_summary, ConsoleReporter};

/// url-harvest: bulk URL fetcher with resumable checkpoints
///
/// Downloads every URL of a list into one file per URL, and reduces stored
/// HTML pages to their readable body text.
#[derive(Parser, Debug)]
#[command(name = "url-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Bulk URL fetcher and HTML text extractor", long_about = None)]
struct Cli {
    /// Optional TOML file providing defaults for both commands
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download every URL of the input list
    Download(DownloadArgs),

    /// Extract text from already downloaded files
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Don't run more downloads than this at once [default: 20]
    #[arg(long, value_name = "N")]
    max_concurrent_downloads: Option<usize>,

    /// Output directory with one file per URL [default: scraped]
    #[arg(long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// File containing the URLs to fetch, one per line [default: urls.txt]
    #[arg(long, value_name = "FILE")]
    infile: Option<PathBuf>,

    /// File recording which urls have been scanned [default: scraped.txt]
    #[arg(long, value_name = "FILE")]
    checkfile: Option<PathBuf>,

    /// File recording urls whose text was extracted, text mode only [default: parsed.txt]
    #[arg(long, value_name = "FILE")]
    parsedfile: Option<PathBuf>,

    /// Seconds after which a request is considered failed [default: 30]
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Minimum size of the strings to be captured, text mode only [default: 100]
    #[arg(long, value_name = "N")]
    min_length: Option<usize>,

    /// Store raw response bodies or extracted text [default: raw]
    #[arg(long, value_name = "MODE")]
    persist: Option<PersistMode>,

    /// Re-fetch already checked urls whose file is missing
    #[arg(long)]
    retry_missing: bool,

    /// User-Agent header sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// File listing the filenames to process [default: scraped.txt]
    #[arg(long, value_name = "FILE")]
    listfile: Option<PathBuf>,

    /// Directory that contains the downloaded files [default: scraped]
    #[arg(long, value_name = "DIR")]
    datadir: Option<PathBuf>,

    /// Directory that will contain the cleaned text [default: parsed]
    #[arg(long, value_name = "DIR")]
    outdir: Option<PathBuf>,

    /// File listing every processed filename [default: parsed.txt]
    #[arg(long, value_name = "FILE")]
    outfile: Option<PathBuf>,

    /// Minimum size of the strings to be captured [default: 100]
    #[arg(long, value_name = "N")]
    min_length: Option<usize>,
}

impl From<DownloadArgs> for DownloadSection {
    fn from(args: DownloadArgs) -> Self {
        Self {
            max_concurrent_downloads: args.max_concurrent_downloads,
            outdir: args.outdir,
            infile: args.infile,
            checkfile: args.checkfile,
            parsedfile: args.parsedfile,
            timeout: args.timeout,
            min_length: args.min_length,
            persist: args.persist,
            retry_missing: args.retry_missing.then_some(true),
            user_agent: args.user_agent,
        }
    }
}

impl From<ExtractArgs> for ExtractSection {
    fn from(args: ExtractArgs) -> Self {
        Self {
            listfile: args.listfile,
            datadir: args.datadir,
            outdir: args.outdir,
            outfile: args.outfile,
            min_length: args.min_length,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let file = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let file = load_config(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            Some(file)
        }
        None => None,
    };

    match cli.command {
        Command::Download(args) => handle_download(args, file.as_ref()).await,
        Command::Extract(args) => handle_extract(args, file.as_ref()).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("url_harvest=info,warn"),
            1 => EnvFilter::new("url_harvest=debug,info"),
            2 => EnvFilter::new("url_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the `download` command
async fn handle_download(args: DownloadArgs, file: Option<&ConfigFile>) -> anyhow::Result<()> {
    let config = resolve_download(args.into(), file).context("Invalid download settings")?;

    let summary = run_download(config, Arc::new(ConsoleReporter))
        .await
        .context("Download aborted")?;

    println!();
    log_download_summary(&summary);
    Ok(())
}

/// Handles the `extract` command
async fn handle_extract(args: ExtractArgs, file: Option<&ConfigFile>) -> anyhow::Result<()> {
    let config = resolve_extract(args.into(), file).context("Invalid extract settings")?;

    // Sequential and CPU bound; keep it off the async workers
    let summary = tokio::task::spawn_blocking(move || run_batch_extract(&config, &ConsoleReporter))
        .await
        .context("Extraction task failed")?
        .context("Extraction aborted")?;

    log_batch_summary(&summary);
    Ok(())
}
