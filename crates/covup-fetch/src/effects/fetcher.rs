use std::future::Future;
use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::core::{is_redirect, is_success, parse_source_url, resolve_redirect};
use crate::data::{FetchOptions, FetchOutcome, Progress};
use crate::effects::http::{HttpClient, HttpResponse};
use crate::effects::partial::{PartialFile, ensure_parent_directory, remove_stale_destination};
use crate::effects::reporter::ProgressReporter;
use crate::error::{FetchError, Result};

/// Streams HTTP(S) resources to disk.
///
/// Bytes land in a `.part` file next to the destination and are renamed into
/// place only after the whole body was written and synced. Every failure
/// removes the `.part` file and any file already at the destination.
pub struct Fetcher<C: HttpClient> {
    client: C,
}

impl<C: HttpClient> Fetcher<C> {
    pub fn new(client: C) -> Self { Self { client } }

    pub fn client(&self) -> &C { &self.client }

    /// Download `url` into `destination`.
    pub async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        options: &FetchOptions,
    ) -> Result<FetchOutcome> {
        let url = parse_source_url(url)?;

        if !options.overwrite
            && tokio::fs::try_exists(destination)
                .await
                .map_err(|e| FetchError::io(destination, e))?
        {
            tracing::debug!(dest = %destination.display(), "destination exists, skipping download");
            return Ok(FetchOutcome::Skipped);
        }

        ensure_parent_directory(destination).await?;

        // The caller's token is only observed. Timeouts cancel this child.
        let token = options
            .cancel
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);

        tracing::debug!(%url, dest = %destination.display(), "starting download");
        let result = self.fetch_inner(&url, destination, options, &token).await;
        let bytes = match result {
            Ok(bytes) => bytes,
            Err(e) => {
                if matches!(e, FetchError::Timeout { .. }) {
                    token.cancel();
                }
                // A failed attempt never leaves an older copy behind.
                remove_stale_destination(destination).await;
                return Err(e);
            }
        };

        tracing::debug!(%url, bytes, "download complete");
        Ok(FetchOutcome::Downloaded { bytes })
    }

    async fn fetch_inner(
        &self,
        url: &Url,
        destination: &Path,
        options: &FetchOptions,
        token: &CancellationToken,
    ) -> Result<u64> {
        let response = self.follow_redirects(url, options, token).await?;
        let total = response.content_length;
        let mut reporter = ProgressReporter::new(options.on_progress.clone());

        let mut partial = PartialFile::create(destination).await?;
        let received = match stream_body(response, &mut partial, &mut reporter, options, token).await {
            Ok(received) => received,
            Err(e) => {
                partial.discard().await;
                return Err(e);
            }
        };
        partial.persist(destination).await?;

        reporter.finish(Progress::new(received, total));
        Ok(received)
    }

    async fn follow_redirects(
        &self,
        url: &Url,
        options: &FetchOptions,
        token: &CancellationToken,
    ) -> Result<HttpResponse<C::Error>> {
        let mut current = url.clone();
        let mut redirects = 0u32;

        loop {
            let response = guarded(
                async { self.client.get(&current).await.map_err(FetchError::network) },
                options.timeout,
                options.timeout_ms(),
                token,
            )
            .await?;

            if is_redirect(response.status) {
                if redirects >= options.max_redirects {
                    return Err(FetchError::RedirectLimit {
                        max: options.max_redirects,
                    });
                }
                let location = response.location.as_deref().ok_or_else(|| {
                    FetchError::Network(format!(
                        "redirect {} from {current} without Location header",
                        response.status
                    ))
                })?;
                let next = resolve_redirect(&current, location)?;
                tracing::debug!(from = %current, to = %next, "following redirect");
                redirects += 1;
                current = next;
                continue;
            }

            if !is_success(response.status) {
                return Err(FetchError::HttpStatus {
                    status: response.status,
                    url:    current.to_string(),
                });
            }
            return Ok(response);
        }
    }
}

async fn stream_body<E: std::error::Error>(
    response: HttpResponse<E>,
    partial: &mut PartialFile,
    reporter: &mut ProgressReporter,
    options: &FetchOptions,
    token: &CancellationToken,
) -> Result<u64> {
    let total = response.content_length;
    let mut body = response.body;
    let mut received = 0u64;

    reporter.report(Progress::new(0, total));
    loop {
        let next = guarded(
            async { Ok(body.next().await) },
            options.timeout,
            options.timeout_ms(),
            token,
        )
        .await?;
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(FetchError::network)?;

        tokio::select! {
            biased;
            _ = token.cancelled() => return Err(FetchError::Aborted),
            written = partial.write_all(&chunk) => written?,
        }

        received += chunk.len() as u64;
        reporter.report(Progress::new(received, total));
    }
    Ok(received)
}

/// Run `fut` unless the token fires first or `timeout` elapses.
async fn guarded<T, F>(
    fut: F,
    timeout: Duration,
    timeout_ms: u64,
    token: &CancellationToken,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(FetchError::Aborted),
        res = tokio::time::timeout(timeout, fut) => match res {
            Ok(inner) => inner,
            Err(_) => Err(FetchError::Timeout { timeout_ms }),
        },
    }
}
