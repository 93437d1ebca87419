//! Error types for covup-fetch.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("download aborted")]
    Aborted,

    #[error("redirect limit exceeded (max {max})")]
    RedirectLimit { max: u32 },

    #[error("file I/O error on {}: {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn network<E: std::error::Error>(e: E) -> Self { Self::Network(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, FetchError>;
