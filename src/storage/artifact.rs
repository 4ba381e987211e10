//! Per-URL artifact files
//!
//! One file per URL, named by [`url_to_filename`]. The presence of that file
//! is what marks a URL as done.

use crate::url::url_to_filename;
use std::io;
use std::path::{Path, PathBuf};

/// Directory of stored artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens an artifact directory, creating it if missing
    pub fn open(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Refers to an existing artifact directory without touching the disk
    pub fn at(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the artifact for a URL
    pub fn path_for_url(&self, url: &str) -> PathBuf {
        self.dir.join(url_to_filename(url))
    }

    /// Path of an artifact by filename
    pub fn path_for_name(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Whether an artifact for this URL is already on disk
    pub fn contains_url(&self, url: &str) -> bool {
        self.path_for_url(url).exists()
    }
}
