//! Async subprocess builder with streamed, tail-captured output.

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Output, Stdio};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Bytes of stdout/stderr kept for error reports.
pub const OUTPUT_TAIL_LIMIT: usize = 64 * 1024;

const PUMP_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug)]
pub struct Command {
    inner:       tokio::process::Command,
    program:     String,
    passthrough: bool,
}

/// How a streamed child process ended.
#[derive(Debug, Clone)]
pub struct ExitReport {
    pub status: ExitStatus,
    /// Last [`OUTPUT_TAIL_LIMIT`] bytes of stdout, lossily decoded.
    pub stdout: String,
    /// Last [`OUTPUT_TAIL_LIMIT`] bytes of stderr, lossily decoded.
    pub stderr: String,
}

impl ExitReport {
    pub fn success(&self) -> bool { self.status.success() }
}

impl Command {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        let program = program.as_ref();
        let mut inner = tokio::process::Command::new(program);
        inner.kill_on_drop(true);
        Self {
            inner,
            program: program.to_string_lossy().into_owned(),
            passthrough: true,
        }
    }

    pub fn program(&self) -> &str { &self.program }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    #[must_use]
    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.inner.env(key, val);
        self
    }

    #[must_use]
    pub fn env_remove(mut self, key: impl AsRef<OsStr>) -> Self {
        self.inner.env_remove(key);
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.inner.current_dir(dir);
        self
    }

    /// Whether [`Command::run`] copies the child's output to our own
    /// stdout/stderr. On by default.
    #[must_use]
    pub fn passthrough(mut self, enabled: bool) -> Self {
        self.passthrough = enabled;
        self
    }

    /// Run to completion and collect all output.
    pub async fn capture(mut self) -> Result<Output> {
        self.inner
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed {
                cmd:    self.program.clone(),
                source: e,
            })
    }

    /// Run to completion, streaming output through while keeping a bounded
    /// tail of each stream.
    ///
    /// If `cancel` fires first the child is killed and
    /// [`Error::Cancelled`] is returned.
    pub async fn run(mut self, cancel: &CancellationToken) -> Result<ExitReport> {
        let mut child = self
            .inner
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::CommandFailed {
                cmd:    self.program.clone(),
                source: e,
            })?;
        tracing::debug!(program = %self.program, pid = ?child.id(), "spawned");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let passthrough = self.passthrough;

        let finished = async {
            let (status, out, err) = tokio::join!(
                child.wait(),
                pump(stdout, tokio::io::stdout(), passthrough),
                pump(stderr, tokio::io::stderr(), passthrough),
            );
            (status, out, err)
        };

        let (status, stdout, stderr) = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(program = %self.program, "cancelled, killing child");
                return Err(Error::Cancelled { cmd: self.program });
            }
            done = finished => done,
        };

        let output_error = |source| Error::Output {
            cmd: self.program.clone(),
            source,
        };
        Ok(ExitReport {
            status: status.map_err(output_error)?,
            stdout: stdout.map_err(output_error)?.into_string(),
            stderr: stderr.map_err(output_error)?.into_string(),
        })
    }
}

/// Keeps only the newest `limit` bytes pushed into it.
#[derive(Debug)]
pub struct TailBuffer {
    bytes: Vec<u8>,
    limit: usize,
}

impl TailBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            bytes: Vec::new(),
            limit,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.len() >= self.limit {
            self.bytes.clear();
            self.bytes.extend_from_slice(&chunk[chunk.len() - self.limit..]);
            return;
        }
        self.bytes.extend_from_slice(chunk);
        if self.bytes.len() > self.limit {
            let excess = self.bytes.len() - self.limit;
            self.bytes.drain(..excess);
        }
    }

    pub fn as_bytes(&self) -> &[u8] { &self.bytes }

    pub fn into_string(self) -> String { String::from_utf8_lossy(&self.bytes).into_owned() }
}

async fn pump<R, W>(reader: Option<R>, mut writer: W, mut passthrough: bool) -> std::io::Result<TailBuffer>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut tail = TailBuffer::new(OUTPUT_TAIL_LIMIT);
    let Some(mut reader) = reader else {
        return Ok(tail);
    };
    let mut buf = vec![0u8; PUMP_BUFFER_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if passthrough {
            let written = async {
                writer.write_all(&buf[..n]).await?;
                writer.flush().await
            };
            if let Err(e) = written.await {
                tracing::warn!(error = %e, "cannot forward child output; capturing only");
                passthrough = false;
            }
        }
        tail.push(&buf[..n]);
    }
    Ok(tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_args() {
        let cmd = Command::new("echo").arg("hello").args(["a", "b"]);
        let args: Vec<_> = cmd.inner.as_std().get_args().collect();
        assert_eq!(args, ["hello", "a", "b"]);
        assert_eq!(cmd.program(), "echo");
    }

    #[test]
    fn test_command_env() {
        let cmd = Command::new("echo").env("CODECOV_TOKEN", "t").env_remove("OTHER");
        let envs: Vec<_> = cmd.inner.as_std().get_envs().collect();
        assert_eq!(envs.len(), 2);
    }

    #[test]
    fn test_tail_buffer_keeps_newest_bytes() {
        let mut tail = TailBuffer::new(4);
        tail.push(b"ab");
        tail.push(b"cd");
        tail.push(b"ef");
        assert_eq!(tail.as_bytes(), b"cdef");
    }

    #[test]
    fn test_tail_buffer_oversized_chunk() {
        let mut tail = TailBuffer::new(3);
        tail.push(b"x");
        tail.push(b"123456");
        assert_eq!(tail.as_bytes(), b"456");
        assert_eq!(tail.into_string(), "456");
    }

    #[tokio::test]
    async fn test_spawn_failure_names_program() {
        let err = Command::new("covup-definitely-not-installed")
            .run(&CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::CommandFailed { cmd, .. } => assert_eq!(cmd, "covup-definitely-not-installed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_reports_status_and_tails() {
        let report = Command::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .passthrough(false)
            .run(&CancellationToken::new())
            .await
            .unwrap();
        assert!(!report.success());
        assert_eq!(report.status.code(), Some(3));
        assert_eq!(report.stdout, "out\n");
        assert_eq!(report.stderr, "err\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_passes_env() {
        let report = Command::new("sh")
            .args(["-c", "printf %s \"$COVUP_TEST_VALUE\""])
            .env("COVUP_TEST_VALUE", "from parent")
            .passthrough(false)
            .run(&CancellationToken::new())
            .await
            .unwrap();
        assert!(report.success());
        assert_eq!(report.stdout, "from parent");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_cancelled_kills_child() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            trigger.cancel();
        });
        let started = std::time::Instant::now();
        let err = Command::new("sh")
            .args(["-c", "exec sleep 30"])
            .passthrough(false)
            .run(&token)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_collects_output() {
        let output = Command::new("sh").args(["-c", "echo captured"]).capture().await.unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b"captured\n");
    }
}
