//! Where the uploader looks for coverage reports.

use std::io;
use std::path::{Path, PathBuf};

use crate::config::non_blank;
use crate::error::{Result, TaskError};

/// Either one named report or a directory tree to search. Paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    DirectFile(PathBuf),
    SearchRoot(PathBuf),
}

impl UploadSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::DirectFile(path) | Self::SearchRoot(path) => path,
        }
    }

    /// Re-check a direct file right before it is handed to the uploader.
    pub async fn confirm(&self) -> Result<()> {
        match self {
            Self::DirectFile(path) => require_file(path).await,
            Self::SearchRoot(_) => Ok(()),
        }
    }
}

/// Decide the upload source from the host's inputs.
///
/// A coverage file name wins over a results folder; a relative file name is
/// looked up inside the results folder when one is given. Relative paths are
/// anchored at `working_dir`.
pub async fn resolve_upload_source(
    coverage_file: Option<&str>,
    results_folder: Option<&str>,
    working_dir: &Path,
) -> Result<UploadSource> {
    let folder = non_blank(results_folder).map(|f| working_dir.join(f));

    if let Some(file) = non_blank(coverage_file) {
        let base = folder.as_deref().unwrap_or(working_dir);
        let path = base.join(file);
        require_file(&path).await?;
        return Ok(UploadSource::DirectFile(path));
    }

    folder.map(UploadSource::SearchRoot).ok_or(TaskError::MissingSource)
}

async fn require_file(path: &Path) -> Result<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(TaskError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(TaskError::FileNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(TaskError::io(path, e)),
    }
}
