//! Download delivery for exported files.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use super::DeliveredFile;
use crate::config;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not persist download: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub trait DownloadSink: Send + Sync {
    /// Deliver the file; returns where it landed.
    fn deliver(&self, file: &DeliveredFile) -> Result<PathBuf, DeliveryError>;
}

/// Writes downloads into a directory. A temp file in the target directory is
/// written first and renamed into place, so a failed delivery leaves nothing
/// under the final name.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for DirectorySink {
    fn default() -> Self {
        Self::new(config::downloads_dir())
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, file: &DeliveredFile) -> Result<PathBuf, DeliveryError> {
        std::fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&file.bytes)?;
        tmp.as_file().sync_all()?;

        let target = self.dir.join(&file.name);
        tmp.persist(&target)?;

        tracing::info!(name = %file.name, bytes = file.bytes.len(), "Download delivered");
        Ok(target)
    }
}
