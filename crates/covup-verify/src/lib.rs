//! Checksum verification for downloaded artifacts.
//!
//! Parses `sha256sum`-style manifests and checks files against them with a
//! streaming SHA-256 digest, so large binaries are never held in memory.
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() -> covup_verify::Result<()> {
//! use std::path::Path;
//!
//! covup_verify::verify_checksum(
//!     Path::new("work/codecov"),
//!     Path::new("work/codecov.SHA256SUM"),
//!     Some(&|msg: &str| println!("{msg}")),
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub use self::checksum::{ChecksumLogger, verify_checksum};
pub use self::error::{Result, VerifyError};
pub use self::hasher::{Hasher, Sha256Hasher};
pub use self::manifest::{ChecksumManifest, ManifestEntry, base_name};
pub use self::stream::{HASH_BUFFER_SIZE, hash_reader, sha256_file};

mod checksum;
mod error;
mod hasher;
mod manifest;
mod stream;
