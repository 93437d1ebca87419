use std::path::Path;

use crate::error::{Error, Result};

/// Mode given to downloaded executables.
#[cfg(unix)]
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Mark `path` executable for everyone, writable by the owner.
///
/// Windows has no execute bit; there the call only checks that the file
/// exists.
pub async fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(EXECUTABLE_MODE);
        tokio::fs::set_permissions(path, perms)
            .await
            .map_err(|e| Error::io(path, e))
    }
    #[cfg(not(unix))]
    {
        tokio::fs::metadata(path)
            .await
            .map(|_| ())
            .map_err(|e| Error::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_make_executable_sets_mode() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codecov");
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();

        make_executable(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn test_make_executable_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");
        let err = make_executable(&path).await.unwrap_err();
        assert!(matches!(err, Error::Io { path: p, .. } if p == path));
    }
}
