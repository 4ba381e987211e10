//! Append-only checkpoint ledgers
//!
//! A ledger is a flat text file with one URL (or filename) per line. The
//! checkpoint ledger records every scanned input line in input order, so its
//! Nth entry must equal the Nth line of the input it was built from. The
//! parsed ledger records only URLs whose text was stored.

use std::fs::{File, OpenOptions};
use crate::storage::lines::LossyLines;
use std::io::{self, BufReader, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// Errors raised while reading, validating or appending to a ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Cannot open ledger {path}: {source}")]
    Open { path: String, source: io::Error },

    #[error("Cannot read ledger {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("Cannot read input while validating ledger: {0}")]
    Input(io::Error),

    #[error("Cannot append to ledger {path}: {source}")]
    Append { path: String, source: io::Error },

    #[error("Check file seems to be corrupted at line {line}: input has '{expected}', check file has '{found}'")]
    Misaligned {
        line: usize,
        expected: String,
        found: String,
    },

    #[error("Check file has more entries than the input ({line} lines checked)")]
    InputExhausted { line: usize },

    #[error("Ledger writer lock poisoned")]
    Poisoned,
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Append handle for a ledger file
///
/// All appends go through a single mutex-guarded writer, so concurrent
/// workers can share one ledger behind an `Arc`. Each entry is written as a
/// complete line.
#[derive(Debug)]
pub struct CheckpointLedger {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl CheckpointLedger {
    /// Opens a ledger for appending, creating it if absent
    pub fn open(path: &Path) -> LedgerResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| LedgerError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    /// Opens a ledger after truncating any previous content
    pub fn create(path: &Path) -> LedgerResult<Self> {
        File::create(path).map_err(|source| LedgerError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry as a full line
    pub fn append(&self, entry: &str) -> LedgerResult<()> {
        let mut writer = self.writer.lock().map_err(|_| LedgerError::Poisoned)?;
        writeln!(writer, "{}", entry).map_err(|source| LedgerError::Append {
            path: self.path.display().to_string(),
            source,
        })
    }

    /// Flushes buffered entries to the file
    pub fn flush(&self) -> LedgerResult<()> {
        let mut writer = self.writer.lock().map_err(|_| LedgerError::Poisoned)?;
        writer.flush().map_err(|source| LedgerError::Append {
            path: self.path.display().to_string(),
            source,
        })
    }
}

/// Checks an existing ledger against the head of the input
///
/// Reads the ledger line by line and consumes one input line per entry. Both
/// sides are compared after trimming whitespace. `visit` sees every validated
/// URL in order. On success the input is positioned right after the validated
/// prefix and the number of validated lines is returned.
///
/// A missing ledger file validates zero lines.
///
/// # Errors
///
/// * [`LedgerError::Misaligned`] when an entry differs from the input line
/// * [`LedgerError::InputExhausted`] when the ledger is longer than the input
/// * [`LedgerError::Read`] / [`LedgerError::Input`] on I/O failures
pub fn validate_prefix<I, F>(path: &Path, input: &mut I, mut visit: F) -> LedgerResult<usize>
where
    I: Iterator<Item = io::Result<String>>,
    F: FnMut(&str),
{
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(source) => {
            return Err(LedgerError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };

    let mut validated = 0;
    for entry in LossyLines::new(BufReader::new(file)) {
        let entry = entry.map_err(|source| LedgerError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let line = match input.next() {
            Some(line) => line.map_err(LedgerError::Input)?,
            None => return Err(LedgerError::InputExhausted { line: validated }),
        };

        validated += 1;
        let expected = line.trim();
        let found = entry.trim();
        if expected != found {
            return Err(LedgerError::Misaligned {
                line: validated,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        visit(expected);
    }

    Ok(validated)
}
