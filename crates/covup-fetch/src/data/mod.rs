//! Data layer: immutable types for download configuration and progress tracking.

mod options;
mod progress;

pub use options::{DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT, FetchOptions};
pub use progress::{Progress, ProgressObserver};

/// What a successful [`Fetcher::fetch`](crate::Fetcher::fetch) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was streamed to the destination.
    Downloaded { bytes: u64 },

    /// `overwrite` was off and the destination already existed.
    Skipped,
}
