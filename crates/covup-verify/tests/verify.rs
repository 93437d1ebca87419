use std::path::{Path, PathBuf};
use std::sync::Mutex;

use covup_verify::{Sha256Hasher, VerifyError, verify_checksum};
use tempfile::{TempDir, tempdir};

fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn fixture(contents: &[u8], manifest: impl FnOnce(&str) -> String) -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "file.txt", contents);
    let hash = Sha256Hasher::hex_digest(contents);
    let manifest = write(dir.path(), "SHA256SUM", manifest(&hash).as_bytes());
    (dir, file, manifest)
}

#[tokio::test]
async fn test_matching_entry_among_others_verifies() {
    let (_dir, file, manifest) = fixture(b"coverage uploader", |hash| {
        format!("{hash} file.txt\nfedcba0987654321 other.txt")
    });

    verify_checksum(&file, &manifest, None).await.unwrap();
}

#[tokio::test]
async fn test_logger_receives_two_messages_in_order() {
    let (_dir, file, manifest) = fixture(b"payload", |hash| format!("{hash}  file.txt\n"));
    let messages = Mutex::new(Vec::new());
    let logger = |msg: &str| messages.lock().unwrap().push(msg.to_string());

    verify_checksum(&file, &manifest, Some(&logger)).await.unwrap();

    let messages = messages.into_inner().unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].starts_with("Verifying"));
    assert!(messages[1].ends_with("verified"));
}

#[tokio::test]
async fn test_uppercase_manifest_hash_accepted() {
    let (_dir, file, manifest) = fixture(b"payload", |hash| {
        format!("{} file.txt", hash.to_ascii_uppercase())
    });

    verify_checksum(&file, &manifest, None).await.unwrap();
}

#[tokio::test]
async fn test_mismatch_reports_both_hashes() {
    let (_dir, file, manifest) = fixture(b"tampered", |_| {
        "expected1234567890 file.txt\nfedcba0987654321 other.txt".to_string()
    });
    let actual = Sha256Hasher::hex_digest(b"tampered");

    let err = verify_checksum(&file, &manifest, None).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("expected1234567890"));
    assert!(message.contains(&actual));
    match err {
        VerifyError::ChecksumMismatch { expected, actual: got } => {
            assert_eq!(expected, "expected1234567890");
            assert_eq!(got, actual);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_mismatch_does_not_log_verified() {
    let (_dir, file, manifest) = fixture(b"tampered", |_| "00 file.txt".to_string());
    let messages = Mutex::new(Vec::new());
    let logger = |msg: &str| messages.lock().unwrap().push(msg.to_string());

    assert!(verify_checksum(&file, &manifest, Some(&logger)).await.is_err());
    assert_eq!(messages.into_inner().unwrap().len(), 1);
}

#[tokio::test]
async fn test_partial_name_is_not_found() {
    let (_dir, file, manifest) = fixture(b"payload", |hash| format!("{hash} profile.txt"));

    let err = verify_checksum(&file, &manifest, None).await.unwrap_err();
    match err {
        VerifyError::ChecksumNotFound { filename, manifest: m } => {
            assert_eq!(filename, "file.txt");
            assert_eq!(m, manifest);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_whitespace_is_not_found() {
    let (_dir, file, manifest) = fixture(b"payload", |hash| format!("{hash}file.txt"));

    assert!(matches!(
        verify_checksum(&file, &manifest, None).await,
        Err(VerifyError::ChecksumNotFound { .. })
    ));
}

#[tokio::test]
async fn test_missing_manifest_names_manifest() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "file.txt", b"payload");
    let manifest = dir.path().join("missing.SHA256SUM");

    match verify_checksum(&file, &manifest, None).await.unwrap_err() {
        VerifyError::Read { path, .. } => assert_eq!(path, manifest),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_artifact_names_artifact() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("file.txt");
    let manifest = write(dir.path(), "SHA256SUM", b"abcdef file.txt");

    match verify_checksum(&file, &manifest, None).await.unwrap_err() {
        VerifyError::Read { path, .. } => assert_eq!(path, file),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_large_file_streams() {
    let contents = vec![0xA5u8; 3 * 1024 * 1024 + 7];
    let (_dir, file, manifest) = fixture(&contents, |hash| format!("{hash} file.txt"));

    verify_checksum(&file, &manifest, None).await.unwrap();
}
