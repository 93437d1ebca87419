use std::io;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Hasher, Result, Sha256Hasher, VerifyError};

/// Read buffer used when hashing files. Artifacts are never loaded whole.
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Drain `reader` through `hasher`.
/// Returns the digest and the number of bytes consumed.
pub async fn hash_reader<R, H>(mut reader: R, mut hasher: H) -> io::Result<(Vec<u8>, u64)>
where
    R: AsyncRead + Unpin,
    H: Hasher,
{
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    let mut consumed = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        consumed += n as u64;
    }
    Ok((hasher.finalize(), consumed))
}

/// Lowercase hex SHA-256 of the file at `path`, computed over the whole file.
pub async fn sha256_file(path: &Path) -> Result<String> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| VerifyError::read(path, e))?;
    let (digest, consumed) = hash_reader(file, Sha256Hasher::new())
        .await
        .map_err(|e| VerifyError::read(path, e))?;
    tracing::debug!(path = %path.display(), bytes = consumed, "hashed file");
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_reader_counts_bytes() {
        let data = vec![7u8; HASH_BUFFER_SIZE * 2 + 13];
        let (digest, consumed) = hash_reader(&data[..], Sha256Hasher::new()).await.unwrap();
        assert_eq!(consumed, data.len() as u64);
        assert_eq!(digest, Sha256Hasher::digest(&data));
    }

    #[tokio::test]
    async fn test_hash_reader_empty() {
        let (digest, consumed) = hash_reader(&b""[..], Sha256Hasher::new()).await.unwrap();
        assert_eq!(consumed, 0);
        assert_eq!(digest, Sha256Hasher::digest(b""));
    }

    #[tokio::test]
    async fn test_sha256_file_matches_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, b"hello world").unwrap();

        let hex = sha256_file(&path).await.unwrap();
        assert_eq!(
            hex,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[tokio::test]
    async fn test_sha256_file_missing_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.bin");

        let err = sha256_file(&path).await.unwrap_err();
        match err {
            VerifyError::Read { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
