use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::progress::ProgressObserver;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// Per-call download configuration.
///
/// # Examples
///
/// ```
/// use covup_fetch::FetchOptions;
/// use std::time::Duration;
///
/// let options = FetchOptions::default()
///     .timeout(Duration::from_secs(10))
///     .max_redirects(2)
///     .overwrite(false);
/// ```
#[derive(Clone)]
pub struct FetchOptions {
    /// Longest wait for the response head or for the next body chunk.
    ///
    /// Default: 30 s
    pub timeout: Duration,

    /// Redirects followed before giving up with `RedirectLimit`.
    ///
    /// Default: 5
    pub max_redirects: u32,

    /// When `false` and the destination already exists, the call succeeds
    /// without any network traffic.
    ///
    /// Default: true
    pub overwrite: bool,

    /// Caller-owned cancellation. The fetcher only listens to it and never
    /// cancels it, even when the download times out.
    ///
    /// Default: None
    pub cancel: Option<CancellationToken>,

    /// Best-effort progress observer.
    ///
    /// Invoked at most every 200 ms unless the whole-number percent changed,
    /// plus once when the body has been fully written. A panicking observer
    /// is disabled for the rest of the call and does not fail the download.
    ///
    /// Default: None
    pub on_progress: Option<ProgressObserver>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("timeout", &self.timeout)
            .field("max_redirects", &self.max_redirects)
            .field("overwrite", &self.overwrite)
            .field("cancel", &self.cancel.is_some())
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            overwrite: true,
            cancel: None,
            on_progress: None,
        }
    }
}

impl FetchOptions {
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Attach a caller-owned cancellation token.
    ///
    /// # Examples
    ///
    /// ```
    /// use covup_fetch::FetchOptions;
    /// use tokio_util::sync::CancellationToken;
    ///
    /// let shutdown = CancellationToken::new();
    /// let options = FetchOptions::default().cancel(shutdown.clone());
    /// shutdown.cancel();
    /// ```
    #[must_use]
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set the progress observer.
    ///
    /// # Examples
    ///
    /// ```
    /// use covup_fetch::{FetchOptions, Progress};
    /// use std::sync::Arc;
    ///
    /// let options = FetchOptions::default().on_progress(Arc::new(|progress: &Progress| {
    ///     if let Some(pct) = progress.percent {
    ///         println!("{pct}%");
    ///     }
    /// }));
    /// ```
    #[must_use]
    pub fn on_progress(mut self, observer: ProgressObserver) -> Self {
        self.on_progress = Some(observer);
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}
