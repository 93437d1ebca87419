//! HTTP downloading with progress, timeouts, redirect limits and cancellation.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Key Features
//!
//! - **Streaming**: bodies go straight to disk chunk by chunk
//! - **No partial artifacts**: downloads land in a `.part` file that is renamed
//!   into place on success and removed on any failure
//! - **Bounded**: per-step timeout, redirect limit, cooperative cancellation
//! - **Mechanism-only**: no retries; the caller decides what a failure means

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{is_redirect, parse_source_url};
pub use data::{FetchOptions, FetchOutcome, Progress, ProgressObserver};
pub use effects::{BoxStream, Fetcher, HttpClient, HttpResponse, ensure_parent_directory, staging_path};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{FetchError, Result};
