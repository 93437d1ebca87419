//! Error types for the covup task.

use std::io;
use std::path::PathBuf;

use covup_fetch::FetchError;
use covup_verify::VerifyError;
use thiserror::Error;

use crate::signature::TrustError;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("no upload token: set the token input, the pipeline token or CODECOV_TOKEN")]
    MissingToken,

    #[error("neither a coverage file nor a test results folder was given")]
    MissingSource,

    #[error("coverage file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error("signature verification failed: {0}")]
    Signature(#[from] TrustError),

    #[error(transparent)]
    Platform(#[from] covup_platform::Error),

    /// The uploader could not be started or exited unsuccessfully.
    #[error("{message}")]
    Subprocess {
        message: String,
        stdout:  String,
        stderr:  String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cancelled")]
    Cancelled,
}

impl TaskError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskError>;
