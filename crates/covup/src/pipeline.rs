//! The task orchestrator.
//!
//! A run moves strictly forward through [`Stage`]s. Whatever happens, the
//! cleanup step runs before the terminal result is produced: a token this
//! run placed in the environment is removed and the working directory is
//! deleted.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use covup_fetch::{FetchOptions, FetchOutcome, Fetcher, HttpClient, Progress};
use covup_platform::fs::make_executable;
use covup_platform::{Command, Environment, SecretLifecycle};
use covup_verify::{ChecksumLogger, verify_checksum};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::args::{UploadConfig, build_upload_arguments, render_command_line};
use crate::config::{Endpoints, KEYS_FILE_NAME, TOKEN_VARIABLE, TaskSettings};
use crate::error::{Result, TaskError};
use crate::signature::{SignatureGate, TrustStore};
use crate::source::resolve_upload_source;
use crate::token::{TokenSource, resolve_token};

const WORKDIR_PREFIX: &str = "covup-";
const KEYRING_DIR: &str = "gnupg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    TrustSetup,
    Fetching,
    Verifying,
    Resolving,
    Executing,
    Cleanup,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::TrustSetup => "trust setup",
            Stage::Fetching => "fetching",
            Stage::Verifying => "verifying",
            Stage::Resolving => "resolving",
            Stage::Executing => "executing",
            Stage::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Terminal outcome reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    Succeeded(String),
    Failed(String),
}

impl TaskResult {
    pub fn is_success(&self) -> bool { matches!(self, TaskResult::Succeeded(_)) }

    pub fn message(&self) -> &str {
        match self {
            TaskResult::Succeeded(msg) | TaskResult::Failed(msg) => msg,
        }
    }
}

/// A failed run: the stage that was active and what went wrong there.
#[derive(Debug)]
pub struct TaskFailure {
    pub stage: Stage,
    pub error: TaskError,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}

impl std::error::Error for TaskFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> { Some(&self.error) }
}

/// Files inside the per-run working directory.
#[derive(Debug, Clone)]
struct WorkLayout {
    keys:       PathBuf,
    keyring:    PathBuf,
    executable: PathBuf,
    manifest:   PathBuf,
    signature:  PathBuf,
}

impl WorkLayout {
    fn new(root: &Path, endpoints: &Endpoints) -> Self {
        Self {
            keys:       root.join(KEYS_FILE_NAME),
            keyring:    root.join(KEYRING_DIR),
            executable: root.join(&endpoints.binary_name),
            manifest:   root.join(endpoints.manifest_file_name()),
            signature:  root.join(endpoints.signature_file_name()),
        }
    }
}

struct RunState {
    stage:     Stage,
    workspace: Option<TempDir>,
}

impl RunState {
    fn enter(&mut self, stage: Stage) {
        self.stage = stage;
        tracing::info!(stage = %stage, "entering stage");
    }
}

pub struct Pipeline<C: HttpClient, T: TrustStore, E: Environment> {
    fetcher:  Fetcher<C>,
    trust:    T,
    env:      E,
    settings: TaskSettings,
    cancel:   CancellationToken,
}

impl<C: HttpClient, T: TrustStore, E: Environment> Pipeline<C, T, E> {
    pub fn new(client: C, trust: T, env: E, settings: TaskSettings) -> Self {
        Self {
            fetcher: Fetcher::new(client),
            trust,
            env,
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// Observe `token`; cancelling it stops the run at the next suspension
    /// point. The pipeline never cancels it.
    #[must_use]
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn settings(&self) -> &TaskSettings { &self.settings }

    /// Run every stage, then clean up, and report the outcome.
    pub async fn run(self) -> TaskResult {
        match self.try_run().await {
            Ok(message) => {
                tracing::info!("{message}");
                TaskResult::Succeeded(message)
            }
            Err(failure) => {
                tracing::error!(stage = %failure.stage, error = %failure.error, "task failed");
                if let TaskError::Subprocess { stdout, stderr, .. } = &failure.error {
                    if !stdout.trim().is_empty() {
                        tracing::error!("uploader stdout:\n{}", stdout.trim_end());
                    }
                    if !stderr.trim().is_empty() {
                        tracing::error!("uploader stderr:\n{}", stderr.trim_end());
                    }
                }
                TaskResult::Failed(failure.to_string())
            }
        }
    }

    /// Like [`Pipeline::run`], but hands back the typed error and the stage
    /// it happened in. Cleanup has already run when this returns.
    pub async fn try_run(mut self) -> std::result::Result<String, TaskFailure> {
        let mut secret = SecretLifecycle::new(TOKEN_VARIABLE);
        let mut state = RunState {
            stage:     Stage::Init,
            workspace: None,
        };
        tracing::info!(stage = %Stage::Init, "entering stage");

        let result = self.run_stages(&mut state, &mut secret).await;
        let failed_stage = state.stage;

        state.enter(Stage::Cleanup);
        self.cleanup(&mut secret, state.workspace.take()).await;

        result.map_err(|error| TaskFailure {
            stage: failed_stage,
            error,
        })
    }

    async fn run_stages(&mut self, state: &mut RunState, secret: &mut SecretLifecycle) -> Result<String> {
        // Init: nothing touches the network until the inputs are known good.
        let token = resolve_token(&self.settings.token, &self.env, TOKEN_VARIABLE)?;
        if token.source() != TokenSource::Environment {
            secret.inject(&mut self.env, token.value());
        }
        tracing::debug!(source = ?token.source(), "upload token resolved");

        let source = resolve_upload_source(
            self.settings.coverage_file.as_deref(),
            self.settings.results_folder.as_deref(),
            &self.settings.working_dir,
        )
        .await?;
        tracing::debug!(?source, "upload source resolved");

        let workspace = self.create_workspace().await?;
        let layout = WorkLayout::new(workspace.path(), &self.settings.endpoints);
        state.workspace = Some(workspace);

        let endpoints = &self.settings.endpoints;
        let mut gate = SignatureGate::new(&self.trust, &layout.keyring);

        state.enter(Stage::TrustSetup);
        self.download(&endpoints.keys, &layout.keys).await?;
        self.cancellable(gate.import_trusted_keys(&layout.keys)).await??;

        state.enter(Stage::Fetching);
        self.download(&endpoints.executable, &layout.executable).await?;
        self.download(&endpoints.manifest, &layout.manifest).await?;
        self.download(&endpoints.signature, &layout.signature).await?;

        state.enter(Stage::Verifying);
        self.cancellable(gate.verify_manifest_signature(&layout.manifest, &layout.signature, &layout.keys))
            .await??;
        let logger: ChecksumLogger<'_> = &|msg: &str| tracing::info!("{msg}");
        self.cancellable(verify_checksum(&layout.executable, &layout.manifest, Some(logger)))
            .await??;

        state.enter(Stage::Resolving);
        source.confirm().await?;
        let config = UploadConfig {
            verbose: self.settings.verbose,
            source,
            network_root_folder: self.settings.network_root_folder.clone(),
            options: self.settings.options.clone(),
        };

        state.enter(Stage::Executing);
        make_executable(&layout.executable).await?;
        let args = build_upload_arguments(&config);
        tracing::info!(
            command = %render_command_line(&layout.executable.display().to_string(), &args),
            "running uploader"
        );
        let report = Command::new(&layout.executable)
            .args(&args)
            .env(TOKEN_VARIABLE, token.value())
            .current_dir(&self.settings.working_dir)
            .run(&self.cancel)
            .await
            .map_err(|e| match e {
                covup_platform::Error::Cancelled { .. } => TaskError::Cancelled,
                other => TaskError::Subprocess {
                    message: other.to_string(),
                    stdout:  String::new(),
                    stderr:  String::new(),
                },
            })?;

        if !report.success() {
            return Err(TaskError::Subprocess {
                message: format!("{} exited with {}", endpoints.binary_name, report.status),
                stdout:  report.stdout,
                stderr:  report.stderr,
            });
        }
        Ok(format!("{} uploaded coverage successfully", endpoints.binary_name))
    }

    async fn create_workspace(&self) -> Result<TempDir> {
        let parent = &self.settings.temp_dir;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TaskError::io(parent, e))?;
        let dir = tempfile::Builder::new()
            .prefix(WORKDIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|e| TaskError::io(parent, e))?;
        tracing::debug!(path = %dir.path().display(), "working directory created");
        Ok(dir)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let label = url.to_string();
        let options = FetchOptions::default()
            .timeout(self.settings.timeout)
            .cancel(self.cancel.clone())
            .on_progress(Arc::new(move |p: &Progress| {
                tracing::debug!(url = %label, received = p.bytes_received, percent = ?p.percent, "download progress");
            }));

        match self.fetcher.fetch(url, dest, &options).await? {
            FetchOutcome::Downloaded { bytes } => tracing::info!(%url, bytes, "downloaded"),
            FetchOutcome::Skipped => tracing::debug!(%url, "already present"),
        }
        Ok(())
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(TaskError::Cancelled),
            out = fut => Ok(out),
        }
    }

    async fn cleanup(&mut self, secret: &mut SecretLifecycle, workspace: Option<TempDir>) {
        secret.clear(&mut self.env);

        let Some(dir) = workspace else {
            return;
        };
        match tokio::fs::remove_dir_all(dir.path()).await {
            Ok(()) => tracing::debug!(path = %dir.path().display(), "working directory removed"),
            Err(e) => tracing::warn!(
                path = %dir.path().display(),
                error = %e,
                "failed to remove working directory"
            ),
        }
    }
}
