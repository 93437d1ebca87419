//! `sha256sum`-style checksum manifests.
//!
//! Each meaningful line is `<hex digest> <whitespace> ... <filename>`. Blank
//! lines and lines starting with `#` are skipped. The digest is the first
//! token and the filename is the last one; a line with a single token carries
//! no filename and is ignored.

use std::path::{Path, PathBuf};

use crate::{Result, VerifyError};

/// One `(expected hash, filename)` pair, kept verbatim from the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub hash:     String,
    pub filename: String,
}

impl ManifestEntry {
    /// Hex comparison, ignoring case.
    pub fn matches_hash(&self, actual: &str) -> bool {
        self.hash.eq_ignore_ascii_case(actual)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: Vec<ManifestEntry>,
}

impl ChecksumManifest {
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let mut tokens = line.split_whitespace();
                let hash = tokens.next()?;
                let filename = tokens.last()?;
                Some(ManifestEntry {
                    hash:     hash.to_string(),
                    filename: filename.to_string(),
                })
            })
            .collect();
        Self { entries }
    }

    /// Read and parse a manifest file.
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| VerifyError::read(path, e))?;
        Ok(Self::parse(&text))
    }

    pub fn entries(&self) -> &[ManifestEntry] { &self.entries }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Find the entry for `filename` by exact last-token equality.
    ///
    /// Repeated entries that agree on the hash resolve to the first one.
    /// Repeated entries that disagree are rejected, since there is no way to
    /// tell which one the signer meant.
    pub fn lookup(&self, filename: &str, manifest_path: &Path) -> Result<&ManifestEntry> {
        let mut matches = self.entries.iter().filter(|e| e.filename == filename);
        let first = matches.next().ok_or_else(|| VerifyError::ChecksumNotFound {
            filename: filename.to_string(),
            manifest: manifest_path.to_path_buf(),
        })?;

        if matches.any(|other| !first.matches_hash(&other.hash)) {
            return Err(VerifyError::ConflictingEntries {
                filename: filename.to_string(),
                manifest: manifest_path.to_path_buf(),
            });
        }
        Ok(first)
    }
}

/// Base name of `path` as a string, the key manifests are indexed by.
pub fn base_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| VerifyError::NoFileName {
            path: PathBuf::from(path),
        })
}
