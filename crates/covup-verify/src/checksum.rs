use std::path::Path;

use crate::manifest::{ChecksumManifest, base_name};
use crate::stream::sha256_file;
use crate::{Result, VerifyError};

/// Receives the two human-readable progress lines of [`verify_checksum`].
pub type ChecksumLogger<'a> = &'a (dyn Fn(&str) + Send + Sync);

/// Verify `file` against the entry for its base name in `manifest`.
///
/// On success `logger` sees exactly two messages: one before hashing starts
/// and one after the digest matched.
pub async fn verify_checksum(
    file: &Path,
    manifest: &Path,
    logger: Option<ChecksumLogger<'_>>,
) -> Result<()> {
    let log = |msg: &str| {
        if let Some(logger) = logger {
            logger(msg);
        }
    };

    let filename = base_name(file)?;
    let parsed = ChecksumManifest::load(manifest).await?;
    let entry = parsed.lookup(&filename, manifest)?;

    log(&format!("Verifying SHA-256 checksum of {filename}"));
    let actual = sha256_file(file).await?;

    if !entry.matches_hash(&actual) {
        tracing::debug!(file = %file.display(), expected = %entry.hash, %actual, "checksum mismatch");
        return Err(VerifyError::ChecksumMismatch {
            expected: entry.hash.clone(),
            actual,
        });
    }

    log(&format!("SHA-256 checksum of {filename} verified"));
    Ok(())
}
