use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::{FetchError, Result};

/// Create every missing parent directory of `path`.
pub async fn ensure_parent_directory(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::io(parent, e)),
        _ => Ok(()),
    }
}

/// Staging path for `destination`: a `.part` sibling, so the final rename
/// never crosses filesystems.
pub fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "download".into());
    name.push(".part");
    destination.with_file_name(name)
}

/// Remove whatever sits at `destination` after a failed download attempt.
/// A missing file is fine; other failures are logged and swallowed so the
/// download error stays the one reported.
pub(crate) async fn remove_stale_destination(destination: &Path) {
    match tokio::fs::remove_file(destination).await {
        Ok(()) => tracing::debug!(path = %destination.display(), "removed stale destination"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(
            path = %destination.display(),
            error = %e,
            "failed to remove stale destination"
        ),
    }
}

/// A download in progress.
///
/// Exactly one of [`PartialFile::persist`] or [`PartialFile::discard`] runs
/// per guard, since both consume it. A guard dropped without either (the
/// download future was abandoned) removes the staging file synchronously.
pub(crate) struct PartialFile {
    path:  PathBuf,
    file:  Option<File>,
    armed: bool,
}

impl PartialFile {
    pub(crate) async fn create(destination: &Path) -> Result<Self> {
        let path = staging_path(destination);
        let file = File::create(&path)
            .await
            .map_err(|e| FetchError::io(&path, e))?;
        Ok(Self {
            path,
            file: Some(file),
            armed: true,
        })
    }

    pub(crate) async fn write_all(&mut self, chunk: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            FetchError::io(&self.path, io::Error::other("staging file already closed"))
        })?;
        file.write_all(chunk)
            .await
            .map_err(|e| FetchError::io(&self.path, e))
    }

    /// Flush, close and move the staging file over `destination`.
    pub(crate) async fn persist(mut self, destination: &Path) -> Result<()> {
        if let Err(e) = self.close().await {
            self.discard().await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&self.path, destination).await {
            let err = FetchError::io(destination, e);
            self.discard().await;
            return Err(err);
        }
        self.armed = false;
        Ok(())
    }

    /// Drop the handle (if still open) and remove the staging file.
    /// Failures here are logged, never returned, so they cannot hide the
    /// error that caused the discard.
    pub(crate) async fn discard(mut self) {
        drop(self.file.take());
        self.armed = false;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed partial download"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove partial download"
            ),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.map_err(|e| FetchError::io(&self.path, e))?;
            file.sync_all()
                .await
                .map_err(|e| FetchError::io(&self.path, e))?;
        }
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        drop(self.file.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "removed abandoned partial download"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove abandoned partial download"
            ),
        }
    }
}
