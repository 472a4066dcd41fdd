//! Upload directory management
//!
//! Files are created with create-new semantics so two uploads can never land
//! on the same name; a clash simply draws a fresh random stem.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::names;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no free file name after {0} attempts")]
    NamesExhausted(u32),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The flat directory holding every stored file
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    name_length: usize,
    max_attempts: u32,
}

impl UploadStore {
    pub fn new(dir: impl AsRef<Path>, name_length: usize, max_attempts: u32) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            name_length,
            max_attempts,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Open a new, empty file named `<random>.<extension>`
    pub async fn create(&self, extension: &str) -> Result<PendingFile, StoreError> {
        let length = self.name_length;
        self.create_with(|| names::random_name(length, extension))
            .await
    }

    async fn create_with(
        &self,
        mut next_name: impl FnMut() -> String,
    ) -> Result<PendingFile, StoreError> {
        for attempt in 1..=self.max_attempts {
            let name = next_name();
            let path = self.dir.join(&name);
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    return Ok(PendingFile {
                        name,
                        path,
                        file,
                        written: 0,
                        keep: false,
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::debug!(%name, attempt, "generated name already taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StoreError::NamesExhausted(self.max_attempts))
    }

    /// Map a requested name onto a path inside the upload directory
    pub fn resolve(&self, requested: &str) -> Option<PathBuf> {
        resolve_in(&self.dir, requested)
    }
}

/// Resolve the final segment of `requested` inside `dir`.
///
/// Everything before the last `/` is ignored, which keeps lookups inside
/// `dir`. Hidden names and names containing a backslash resolve to nothing.
pub fn resolve_in(dir: &Path, requested: &str) -> Option<PathBuf> {
    let name = requested.rsplit('/').next()?;
    if name.is_empty() || name.starts_with('.') || name.contains(|c: char| c == '\\' || c == '\0') {
        return None;
    }
    Some(dir.join(name))
}

/// A file that is being written and is removed again unless committed.
///
/// Dropping it uncommitted, including when the writing task is cancelled,
/// deletes the file.
#[derive(Debug)]
pub struct PendingFile {
    name: String,
    path: PathBuf,
    file: File,
    written: u64,
    keep: bool,
}

impl PendingFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn written(&self) -> u64 {
        self.written
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Push buffered writes down to the file
    pub async fn flush(&mut self) -> io::Result<()> {
        self.file.flush().await
    }

    /// Keep the file; returns its name and size. Call [`Self::flush`] first.
    pub fn commit(mut self) -> (String, u64) {
        self.keep = true;
        (std::mem::take(&mut self.name), self.written)
    }

    /// Drop the half-written file
    pub async fn discard(mut self) {
        self.keep = true;
        let path = std::mem::take(&mut self.path);
        drop(self);
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial upload");
        }
    }
}

impl Drop for PendingFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(name = %self.name, "removed abandoned upload"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to remove abandoned upload");
            }
        }
    }
}
