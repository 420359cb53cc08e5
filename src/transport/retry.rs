//! Retrying transport decorator.
//!
//! [`RetryTransport`] wraps an inner [`Transport`] and implements the
//! same trait, so it can be layered transparently anywhere a plain
//! transport is usable. Transport-level errors and `>= 500` responses
//! are retried with a configurable [`Backoff`]; everything below 500
//! (including 4xx client errors) is terminal and returned as-is.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::time::{Sleeper, TokioSleeper};

use super::backoff::Backoff;
use super::client::ReqwestTransport;
use super::error::{AttemptFailure, Error};
use super::http::{BodySource, HttpRequest, HttpResponse, RequestBody, Transport};

/// Observer notified about retry attempts and terminal failures.
///
/// Absence of an observer is silently tolerated: the transport never
/// requires one, and observability events are additive, never a
/// replacement for the error returned to the caller.
pub trait RetryObserver: Send + Sync {
    /// Called after a failed attempt, before sleeping for `event.delay`.
    fn on_retry(&self, event: &RetryEvent<'_>);

    /// Called when the retry budget is exhausted, before the final error
    /// is returned.
    fn on_exhausted(&self, event: &RetryEvent<'_>);
}

/// Snapshot of a failed attempt handed to a [`RetryObserver`].
#[derive(Debug)]
pub struct RetryEvent<'a> {
    /// Method of the request being retried.
    pub method: &'a http::Method,
    /// Target URL of the request being retried.
    pub url: &'a url::Url,
    /// 1-based number of the attempt that just failed.
    pub attempt: u32,
    /// Configured retry ceiling (attempts beyond the first).
    pub max_retries: u32,
    /// Delay before the next attempt; `None` for terminal events.
    pub delay: Option<Duration>,
    /// What went wrong: a `>= 500` status or a transport error.
    pub failure: &'a AttemptFailure,
}

/// [`RetryObserver`] forwarding events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RetryObserver for TracingObserver {
    fn on_retry(&self, event: &RetryEvent<'_>) {
        tracing::warn!(
            method = %event.method,
            url = %event.url,
            attempt = event.attempt,
            max_retries = event.max_retries,
            delay = ?event.delay.unwrap_or_default(),
            failure = %event.failure,
            "request failed, retrying"
        );
    }

    fn on_exhausted(&self, event: &RetryEvent<'_>) {
        tracing::error!(
            method = %event.method,
            url = %event.url,
            attempts = event.attempt,
            failure = %event.failure,
            "all retry attempts failed"
        );
    }
}

/// Transport decorator that retries transient failures.
///
/// Holds no per-request mutable state: attempt counters and bodies are
/// local to each [`send`](Transport::send) call, so one instance can
/// serve unlimited concurrent requests.
///
/// # Type Parameters
///
/// - `T`: The wrapped transport
/// - `S`: The sleeper used for backoff delays (defaults to
///   [`TokioSleeper`])
///
/// # Example
///
/// ```
/// use httpkit::transport::{Backoff, RetryTransport};
/// use std::time::Duration;
///
/// let transport = RetryTransport::with_default_transport(
///     3,
///     Backoff::Exponential {
///         base: Duration::from_millis(500),
///         max: Duration::from_secs(10),
///     },
/// );
/// assert_eq!(transport.max_retries(), 3);
/// ```
pub struct RetryTransport<T, S = TokioSleeper> {
    inner: T,
    max_retries: u32,
    backoff: Backoff,
    sleeper: S,
    observer: Option<Arc<dyn RetryObserver>>,
}

impl<T> RetryTransport<T, TokioSleeper> {
    /// Creates a retrying transport over `inner`.
    ///
    /// `max_retries` is the number of attempts beyond the first; 0 means
    /// a single attempt with no retries.
    #[must_use]
    pub const fn new(inner: T, max_retries: u32, backoff: Backoff) -> Self {
        Self {
            inner,
            max_retries,
            backoff,
            sleeper: TokioSleeper,
            observer: None,
        }
    }
}

impl RetryTransport<ReqwestTransport, TokioSleeper> {
    /// Creates a retrying transport over the platform-default
    /// [`ReqwestTransport`].
    #[must_use]
    pub fn with_default_transport(max_retries: u32, backoff: Backoff) -> Self {
        Self::new(ReqwestTransport::new(), max_retries, backoff)
    }
}

impl<T, S> RetryTransport<T, S> {
    /// Sets a custom sleeper for backoff delays.
    ///
    /// This is primarily useful for testing to avoid actual delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> RetryTransport<T, S2> {
        RetryTransport {
            inner: self.inner,
            max_retries: self.max_retries,
            backoff: self.backoff,
            sleeper,
            observer: self.observer,
        }
    }

    /// Installs an observer for retry and terminal-failure events.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the configured retry ceiling.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the configured backoff strategy.
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }
}

impl<T, S> std::fmt::Debug for RetryTransport<T, S>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryTransport")
            .field("inner", &self.inner)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl<T: Transport, S: Sleeper> RetryTransport<T, S> {
    /// Runs the retry loop for a single logical request.
    ///
    /// Attempts are strictly sequential; only the request body is
    /// replaced between attempts, never method, URL, or headers.
    async fn execute(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            body_source,
            deadline,
        } = req;
        let replayable = body.is_some();
        let mut body = body;

        for attempt in 0..=self.max_retries {
            if attempt > 0 && replayable {
                body = Some(regenerate(body_source.as_ref())?);
            }
            if deadline.is_some_and(|d| d <= Instant::now()) {
                return Err(Error::DeadlineElapsed);
            }

            let attempt_req = HttpRequest {
                method: method.clone(),
                url: url.clone(),
                headers: headers.clone(),
                body: body.take(),
                body_source: None,
                deadline,
            };

            let failure = match self.inner.send(attempt_req).await {
                Ok(resp) if resp.status.as_u16() < 500 => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status;
                    discard(resp).await?;
                    AttemptFailure::Status(status)
                }
                Err(err) => AttemptFailure::Transport(Box::new(err)),
            };

            if attempt < self.max_retries {
                let delay = self.backoff.delay(attempt);
                self.notify_retry(&method, &url, attempt + 1, delay, &failure);
                self.sleep(delay, deadline).await?;
            } else {
                self.notify_exhausted(&method, &url, &failure);
                return Err(Error::RetriesExhausted {
                    attempts: self.max_retries + 1,
                    last_failure: failure,
                });
            }
        }

        unreachable!("retry loop returns from its final iteration")
    }

    /// Sleeps for `delay`, waking early if the deadline fires first.
    async fn sleep(&self, delay: Duration, deadline: Option<Instant>) -> Result<(), Error> {
        let Some(deadline) = deadline else {
            self.sleeper.sleep(delay).await;
            return Ok(());
        };

        let remaining = deadline.saturating_duration_since(Instant::now());
        if delay < remaining {
            self.sleeper.sleep(delay).await;
            Ok(())
        } else {
            self.sleeper.sleep(remaining).await;
            Err(Error::DeadlineElapsed)
        }
    }

    fn notify_retry(
        &self,
        method: &http::Method,
        url: &url::Url,
        attempt: u32,
        delay: Duration,
        failure: &AttemptFailure,
    ) {
        if let Some(observer) = &self.observer {
            observer.on_retry(&RetryEvent {
                method,
                url,
                attempt,
                max_retries: self.max_retries,
                delay: Some(delay),
                failure,
            });
        }
    }

    fn notify_exhausted(&self, method: &http::Method, url: &url::Url, failure: &AttemptFailure) {
        if let Some(observer) = &self.observer {
            observer.on_exhausted(&RetryEvent {
                method,
                url,
                attempt: self.max_retries + 1,
                max_retries: self.max_retries,
                delay: None,
                failure,
            });
        }
    }
}

impl<T: Transport, S: Sleeper> Transport for RetryTransport<T, S> {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        self.execute(req).await
    }
}

fn regenerate(source: Option<&BodySource>) -> Result<RequestBody, Error> {
    source.map_or_else(
        || {
            Err(Error::BodyReplay(io::Error::other(
                "request body cannot be regenerated for replay",
            )))
        },
        |source| source.produce().map_err(Error::BodyReplay),
    )
}

/// Drains and closes a response body that will not reach the caller, so
/// the pooled connection is released before the next attempt.
async fn discard(response: HttpResponse) -> Result<(), Error> {
    let mut body = response.body;
    body.drain().await.map_err(Error::BodyDrain)?;
    body.close().map_err(Error::BodyClose)
}
