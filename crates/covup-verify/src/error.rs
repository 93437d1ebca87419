use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("no checksum entry for {filename:?} in manifest {}", manifest.display())]
    ChecksumNotFound {
        filename: String,
        manifest: PathBuf,
    },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        expected: String,
        actual:   String,
    },

    #[error("manifest {} lists {filename:?} more than once with different checksums", manifest.display())]
    ConflictingEntries {
        filename: String,
        manifest: PathBuf,
    },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} has no file name", path.display())]
    NoFileName { path: PathBuf },
}

impl VerifyError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;
