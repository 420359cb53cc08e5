//! Typed client decoding JSON responses.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::Instant;

use crate::transport::{
    self, HttpRequest, HttpResponse, ReqwestTransport, RetryTransport, Transport,
};

use super::builder::ClientBuilder;
use super::request::BuildError;

/// Error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request failed validation before it could be sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The transport (or its retry layer) failed.
    #[error(transparent)]
    Transport(#[from] transport::Error),

    /// Reading the response body failed.
    #[error("failed to read response body")]
    Body(#[source] std::io::Error),

    /// The response body was not valid JSON for the requested type.
    #[error("failed to decode response JSON")]
    Decode(#[from] serde_json::Error),

    /// The server answered with an error status (`4xx`).
    #[error(transparent)]
    Api(#[from] ErrorResponse),

    /// The underlying HTTP connector could not be initialized.
    #[error("failed to build HTTP connector")]
    Connector(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<BuildError> for ClientError {
    fn from(err: BuildError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

/// Error payload describing a failed API call.
///
/// Deserialized from the response body when possible; falls back to the
/// raw body text, then to the canonical status reason.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message from the API, if any.
    #[serde(default)]
    pub message: Option<String>,

    /// Alternate error field some APIs use instead of `message`.
    #[serde(rename = "error", default)]
    pub error_message: Option<String>,

    /// Additional detail from the API, if any.
    #[serde(default)]
    pub details: Option<String>,

    /// HTTP status code of the response.
    #[serde(rename = "statusCode", default)]
    pub status_code: u16,
}

impl ErrorResponse {
    /// Builds an error payload from a response's status and raw body.
    #[must_use]
    pub fn from_parts(status: http::StatusCode, body: &[u8]) -> Self {
        let mut parsed = if body.is_empty() {
            Self {
                message: None,
                error_message: None,
                details: None,
                status_code: 0,
            }
        } else {
            serde_json::from_slice(body).unwrap_or_else(|_| Self {
                message: Some(String::from_utf8_lossy(body).into_owned()),
                error_message: None,
                details: None,
                status_code: 0,
            })
        };

        if parsed.status_code == 0 {
            parsed.status_code = status.as_u16();
        }
        if parsed.message.is_none() && parsed.error_message.is_none() {
            parsed.message = status.canonical_reason().map(ToString::to_string);
        }

        parsed
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(message) = &self.message {
            write!(f, "http {}: {message}", self.status_code)
        } else if let Some(error) = &self.error_message {
            write!(f, "http {}: {error}", self.status_code)
        } else {
            write!(f, "http {}: request failed", self.status_code)
        }
    }
}

impl std::error::Error for ErrorResponse {}

/// A decoded HTTP response.
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Decoded JSON payload
    pub data: T,
    /// Raw response body
    pub raw_body: Bytes,
}

impl<T> Response<T> {
    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the raw body as a UTF-8 string, if valid.
    #[must_use]
    pub fn body_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.raw_body).ok()
    }
}

/// HTTP client decoding JSON responses into caller-chosen types.
///
/// Wraps a [`Transport`] (by default a [`RetryTransport`] over
/// [`ReqwestTransport`]) and applies an overall per-request timeout
/// above the retry loop, so the timeout bounds the entire retry
/// sequence rather than each individual attempt.
///
/// # Type Parameters
///
/// - `T`: The transport stack; swap in a mock for testing or a
///   pre-built retry stack via [`with_transport`](Self::with_transport).
///
/// # Example
///
/// ```no_run
/// use httpkit::client::{Client, RequestBuilder};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Item {
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder().build()?;
/// let response = client.get::<Item>("https://api.example.com/items/1").await?;
/// println!("{}", response.data.name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Client<T = RetryTransport<ReqwestTransport>> {
    transport: T,
    timeout: Duration,
}

impl Client {
    /// Returns a [`ClientBuilder`] with default settings.
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) const fn from_parts(
        transport: RetryTransport<ReqwestTransport>,
        timeout: Duration,
    ) -> Self {
        Self { transport, timeout }
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client over a custom transport.
    ///
    /// Useful for testing with mocks, or for supplying a pre-built
    /// retry stack.
    #[must_use]
    pub const fn with_transport(transport: T, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Returns the configured overall request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the transport stack.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Executes a request, returning the raw streaming response.
    ///
    /// The caller becomes responsible for draining and closing the
    /// response body.
    ///
    /// # Errors
    ///
    /// Returns the transport error, or
    /// [`transport::Error::DeadlineElapsed`] when the overall timeout
    /// expires before a terminal outcome.
    pub async fn execute_raw(
        &self,
        mut req: HttpRequest,
    ) -> Result<HttpResponse, transport::Error> {
        if req.deadline.is_none() {
            req.deadline = Some(Instant::now() + self.timeout);
        }

        // The timeout bounds the whole retry sequence, not each attempt.
        match tokio::time::timeout(self.timeout, self.transport.send(req)).await {
            Ok(result) => result,
            Err(_) => Err(transport::Error::DeadlineElapsed),
        }
    }

    /// Executes a request and decodes the JSON response into `D`.
    ///
    /// An empty body decodes as JSON `null`, so callers expecting
    /// possibly-empty responses should use `Option<D>`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Api`] for `4xx` statuses,
    /// [`ClientError::Decode`] for undecodable bodies, and
    /// [`ClientError::Transport`] for transport or retry failures.
    pub async fn execute<D: DeserializeOwned>(
        &self,
        req: HttpRequest,
    ) -> Result<Response<D>, ClientError> {
        let response = self.execute_raw(req).await?;
        let status = response.status;
        let headers = response.headers;
        let raw_body = response.body.bytes().await.map_err(ClientError::Body)?;

        if status.as_u16() >= 400 {
            return Err(ClientError::Api(ErrorResponse::from_parts(
                status, &raw_body,
            )));
        }

        let data = if raw_body.is_empty() {
            serde_json::from_slice(b"null")?
        } else {
            serde_json::from_slice(&raw_body)?
        };

        Ok(Response {
            status,
            headers,
            data,
            raw_body,
        })
    }

    /// Performs a GET request to the given URL.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn get<D: DeserializeOwned>(&self, url: &str) -> Result<Response<D>, ClientError> {
        self.execute(HttpRequest::get(parse_url(url)?)).await
    }

    /// Performs a POST request with the given buffered body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn post<D: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<Bytes> + Send,
    ) -> Result<Response<D>, ClientError> {
        self.execute(HttpRequest::post(parse_url(url)?).with_body(body))
            .await
    }

    /// Performs a PUT request with the given buffered body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn put<D: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<Bytes> + Send,
    ) -> Result<Response<D>, ClientError> {
        self.execute(HttpRequest::new(http::Method::PUT, parse_url(url)?).with_body(body))
            .await
    }

    /// Performs a PATCH request with the given buffered body.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn patch<D: DeserializeOwned>(
        &self,
        url: &str,
        body: impl Into<Bytes> + Send,
    ) -> Result<Response<D>, ClientError> {
        self.execute(HttpRequest::new(http::Method::PATCH, parse_url(url)?).with_body(body))
            .await
    }

    /// Performs a DELETE request.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn delete<D: DeserializeOwned>(&self, url: &str) -> Result<Response<D>, ClientError> {
        self.execute(HttpRequest::new(http::Method::DELETE, parse_url(url)?))
            .await
    }
}

fn parse_url(url: &str) -> Result<url::Url, ClientError> {
    url::Url::parse(url).map_err(|err| ClientError::InvalidRequest(format!("invalid URL: {err}")))
}
