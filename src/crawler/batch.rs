//! Batch text extraction over an already downloaded corpus
//!
//! Walks a list of artifact filenames, runs each file through the text
//! extractor and writes the text under the same name into a parallel output
//! directory. Files are processed one at a time.

use crate::config::{validate_extract, ExtractConfig};
use crate::extract::extract_from_reader;
use crate::output::{BatchSummary, MilestoneClock, ProgressReporter};
use crate::storage::{ArtifactStore, CheckpointLedger, LossyLines};
use crate::HarvestError;
use std::fs::File;
use std::io::BufReader;

/// What happened to one listed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Text written to the output directory
    Written,
    /// No qualifying text; nothing written
    Empty,
    /// Source file could not be opened
    Missing,
    /// Output file could not be written
    WriteFailed,
}

/// Runs batch extraction
///
/// Every list line is recorded in the outfile after it is processed,
/// whatever the result. Blank lines are recorded but not processed. The outfile is truncated at the start of the run.
///
/// # Returns
///
/// * `Ok(BatchSummary)` - Every listed file was visited
/// * `Err(HarvestError)` - The list, output directory or outfile could not be opened
pub fn run_batch_extract(
    config: &ExtractConfig,
    reporter: &dyn ProgressReporter,
) -> Result<BatchSummary, HarvestError> {
    validate_extract(config)?;
    let mut clock = MilestoneClock::start();

    let list = File::open(&config.listfile).map_err(|source| HarvestError::InputFile {
        path: config.listfile.display().to_string(),
        source,
    })?;
    let source = ArtifactStore::at(&config.datadir);
    let output = ArtifactStore::open(&config.outdir).map_err(|source| HarvestError::OutputFile {
        path: config.outdir.display().to_string(),
        source,
    })?;
    let done = CheckpointLedger::create(&config.outfile)?;

    tracing::info!(
        "Extracting files listed in {} from {} into {}",
        config.listfile.display(),
        config.datadir.display(),
        config.outdir.display()
    );

    let mut summary = BatchSummary::default();
    for line in LossyLines::new(BufReader::new(list)) {
        let line = line.map_err(|source| HarvestError::InputFile {
            path: config.listfile.display().to_string(),
            source,
        })?;
        let filename = line.trim();

        if filename.is_empty() {
            summary.blank += 1;
        } else {
            match extract_file(&source, &output, filename, config.min_length, &mut summary) {
                FileOutcome::Written => summary.written += 1,
                FileOutcome::Empty => summary.empty += 1,
                FileOutcome::Missing => summary.missing += 1,
                FileOutcome::WriteFailed => summary.write_failed += 1,
            }
        }

        // Blank lines are recorded too, keeping the outfile aligned with the list
        done.append(filename)?;
        clock.tick(summary.scanned, reporter);
        summary.scanned += 1;
    }
    done.flush()?;

    summary.elapsed = clock.elapsed();
    Ok(summary)
}

/// Extracts one file and writes its text if there is any
fn extract_file(
    source: &ArtifactStore,
    output: &ArtifactStore,
    filename: &str,
    min_length: usize,
    summary: &mut BatchSummary,
) -> FileOutcome {
    let input_path = source.path_for_name(filename);
    let file = match File::open(&input_path) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!("Failed to open {}: {}", input_path.display(), e);
            return FileOutcome::Missing;
        }
    };

    let extraction = extract_from_reader(file, min_length);
    if let Some(e) = &extraction.error {
        tracing::warn!("Error parsing {}: {}", filename, e);
        summary.interrupted += 1;
    }

    if extraction.is_empty() {
        tracing::trace!("Ignored empty {}", filename);
        return FileOutcome::Empty;
    }

    let output_path = output.path_for_name(filename);
    match std::fs::write(&output_path, extraction.text.as_bytes()) {
        Ok(()) => FileOutcome::Written,
        Err(e) => {
            tracing::warn!("Failed to write {}: {}", output_path.display(), e);
            FileOutcome::WriteFailed
        }
    }
}
