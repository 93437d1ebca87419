use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no uploader build for {os} on {arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("unknown uploader platform: {0}")]
    UnknownPlatform(String),

    #[error("failed to start {cmd}: {source}")]
    CommandFailed {
        cmd:    String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read output of {cmd}: {source}")]
    Output {
        cmd:    String,
        #[source]
        source: io::Error,
    },

    #[error("{cmd} was cancelled")]
    Cancelled { cmd: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
