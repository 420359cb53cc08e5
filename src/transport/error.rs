//! Error types for transport operations.

use thiserror::Error;

/// Error type for transport operations.
///
/// Both plain transports and the retrying decorator report this type, so
/// the decorator is usable anywhere a plain transport is usable. The
/// `Connection`/`Timeout`/`InvalidUrl` variants are produced by the
/// underlying transport; the remaining variants are produced by the
/// retry layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the configured timeout period.
    #[error("request timed out")]
    Timeout,

    /// The provided URL is invalid.
    ///
    /// This typically indicates a configuration error rather than
    /// a transient failure.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// All retry attempts were consumed without a terminal outcome.
    ///
    /// Carries the last failure observed, either a `>= 500` status code
    /// or the underlying transport error.
    #[error("all retry attempts failed after {attempts} attempts")]
    RetriesExhausted {
        /// Total number of attempts made, including the initial one.
        attempts: u32,
        /// The failure from the final attempt.
        #[source]
        last_failure: AttemptFailure,
    },

    /// A retry needed a fresh copy of the request body, but the body was
    /// not replayable or regeneration failed.
    #[error("failed to obtain replayable request body")]
    BodyReplay(#[source] std::io::Error),

    /// Draining a discarded response body failed; the connection state
    /// is unreliable afterwards, so the request is not retried.
    #[error("failed to discard response body")]
    BodyDrain(#[source] std::io::Error),

    /// Closing a discarded response body failed after a successful drain.
    #[error("failed to close response body")]
    BodyClose(#[source] std::io::Error),

    /// The request's deadline elapsed during an attempt or a backoff
    /// delay.
    #[error("request deadline elapsed")]
    DeadlineElapsed,
}

impl Error {
    /// Returns true if this is the exhausted-retries marker.
    #[must_use]
    pub const fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// Returns true if the request timed out at the transport level.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns the status code of the last failed attempt, if retries
    /// were exhausted by `>= 500` responses.
    #[must_use]
    pub const fn last_status(&self) -> Option<http::StatusCode> {
        match self {
            Self::RetriesExhausted {
                last_failure: AttemptFailure::Status(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }
}

/// The failure recorded for a single retryable attempt.
#[derive(Debug, Error)]
pub enum AttemptFailure {
    /// The server answered with a retryable (`>= 500`) status code.
    #[error("server returned status {0}")]
    Status(http::StatusCode),

    /// The underlying transport reported an error.
    #[error(transparent)]
    Transport(Box<Error>),
}

impl AttemptFailure {
    /// Returns the status code, if the failure was a `>= 500` response.
    #[must_use]
    pub const fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::Status(status) => Some(*status),
            Self::Transport(_) => None,
        }
    }
}
