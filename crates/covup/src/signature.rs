//! Detached-signature verification of the checksum manifest.

use std::ffi::OsString;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use covup_platform::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrustError {
    #[error("cannot import trusted keys from {}: {message}", keys.display())]
    Import { keys: PathBuf, message: String },

    #[error("signature {} does not verify {}: {message}", signature.display(), data.display())]
    BadSignature {
        data:      PathBuf,
        signature: PathBuf,
        message:   String,
    },

    #[error("cannot prepare keyring {}: {source}", path.display())]
    Keyring {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Tool(#[from] covup_platform::Error),
}

/// An OpenPGP keyring that signatures are checked against.
///
/// # Implementations
///
/// - [`GpgTrustStore`]: shells out to `gpg`
/// - Mock implementations for testing
pub trait TrustStore: Send + Sync {
    /// Add the keys in `keys` to the keyring at `keyring`.
    fn import_keys(&self, keyring: &Path, keys: &Path) -> impl Future<Output = Result<(), TrustError>> + Send;

    /// Check that `signature` is a valid detached signature over `data` made
    /// by a key in `keyring`.
    fn verify_detached(
        &self,
        keyring: &Path,
        data: &Path,
        signature: &Path,
    ) -> impl Future<Output = Result<(), TrustError>> + Send;
}

impl<T: TrustStore> TrustStore for &T {
    fn import_keys(&self, keyring: &Path, keys: &Path) -> impl Future<Output = Result<(), TrustError>> + Send {
        (**self).import_keys(keyring, keys)
    }

    fn verify_detached(
        &self,
        keyring: &Path,
        data: &Path,
        signature: &Path,
    ) -> impl Future<Output = Result<(), TrustError>> + Send {
        (**self).verify_detached(keyring, data, signature)
    }
}

/// [`TrustStore`] backed by the `gpg` command line, using an isolated home
/// directory so the user's own keyring is never read or modified.
#[derive(Debug, Clone)]
pub struct GpgTrustStore {
    program: OsString,
}

impl Default for GpgTrustStore {
    fn default() -> Self { Self::new() }
}

impl GpgTrustStore {
    pub fn new() -> Self { Self::with_program("gpg") }

    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, keyring: &Path) -> Command {
        Command::new(&self.program)
            .arg("--homedir")
            .arg(keyring)
            .args(["--batch", "--no-tty"])
    }
}

impl TrustStore for GpgTrustStore {
    async fn import_keys(&self, keyring: &Path, keys: &Path) -> Result<(), TrustError> {
        prepare_keyring(keyring).await?;
        let output = self.command(keyring).arg("--import").arg(keys).capture().await?;
        if !output.status.success() {
            return Err(TrustError::Import {
                keys:    keys.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }

    async fn verify_detached(&self, keyring: &Path, data: &Path, signature: &Path) -> Result<(), TrustError> {
        let output = self
            .command(keyring)
            .arg("--verify")
            .arg(signature)
            .arg(data)
            .capture()
            .await?;
        if !output.status.success() {
            return Err(TrustError::BadSignature {
                data:      data.to_path_buf(),
                signature: signature.to_path_buf(),
                message:   String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

async fn prepare_keyring(keyring: &Path) -> Result<(), TrustError> {
    let keyring_err = |source| TrustError::Keyring {
        path: keyring.to_path_buf(),
        source,
    };
    tokio::fs::create_dir_all(keyring).await.map_err(keyring_err)?;
    // gpg warns about group/world readable home directories.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(keyring, std::fs::Permissions::from_mode(0o700))
            .await
            .map_err(keyring_err)?;
    }
    Ok(())
}

/// Sequences key import and signature verification over one keyring.
///
/// Keys are imported at most once per source file; verifying always makes
/// sure the keys were imported first.
pub struct SignatureGate<'a, T: TrustStore> {
    store:    &'a T,
    keyring:  PathBuf,
    imported: Option<PathBuf>,
}

impl<'a, T: TrustStore> SignatureGate<'a, T> {
    pub fn new(store: &'a T, keyring: impl Into<PathBuf>) -> Self {
        Self {
            store,
            keyring: keyring.into(),
            imported: None,
        }
    }

    pub fn keyring(&self) -> &Path { &self.keyring }

    pub async fn import_trusted_keys(&mut self, keys: &Path) -> Result<(), TrustError> {
        if self.imported.as_deref() == Some(keys) {
            return Ok(());
        }
        self.store.import_keys(&self.keyring, keys).await?;
        tracing::debug!(keys = %keys.display(), "trusted keys imported");
        self.imported = Some(keys.to_path_buf());
        Ok(())
    }

    /// Verify the detached `signature` over `manifest` against `trusted_keys`.
    pub async fn verify_manifest_signature(
        &mut self,
        manifest: &Path,
        signature: &Path,
        trusted_keys: &Path,
    ) -> Result<(), TrustError> {
        self.import_trusted_keys(trusted_keys).await?;
        self.store
            .verify_detached(&self.keyring, manifest, signature)
            .await?;
        tracing::info!(manifest = %manifest.display(), "manifest signature verified");
        Ok(())
    }
}
