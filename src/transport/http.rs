//! HTTP request/response types and the transport trait.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use tokio::time::Instant;

use super::Error;

/// An HTTP request to be sent.
///
/// This is a value type that can be constructed and passed to any
/// [`Transport`] implementation. It uses standard `http` crate types
/// for method and headers, ensuring compatibility with the broader
/// ecosystem.
///
/// The body is a one-shot byte stream. Requests whose body originates
/// from an in-memory buffer also carry a [`BodySource`] so the body can
/// be regenerated for replay across retry attempts; requests with a
/// genuinely one-shot body (e.g. a live upload stream) carry none, and
/// that absence is a checkable state rather than something inferred.
#[derive(Debug)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: http::Method,
    /// Target URL
    pub url: url::Url,
    /// HTTP headers to send
    pub headers: http::HeaderMap,
    /// Optional request body
    pub body: Option<RequestBody>,
    /// Optional capability producing a fresh copy of the body for replay
    pub body_source: Option<BodySource>,
    /// Optional deadline after which the request must not proceed
    pub deadline: Option<Instant>,
}

impl HttpRequest {
    /// Creates a new HTTP request with the given method and URL.
    ///
    /// Headers are initialized to an empty map; body, body source, and
    /// deadline are unset.
    #[must_use]
    pub fn new(method: http::Method, url: url::Url) -> Self {
        Self {
            method,
            url,
            headers: http::HeaderMap::new(),
            body: None,
            body_source: None,
            deadline: None,
        }
    }

    /// Creates a GET request to the given URL.
    #[must_use]
    pub fn get(url: url::Url) -> Self {
        Self::new(http::Method::GET, url)
    }

    /// Creates a POST request to the given URL.
    #[must_use]
    pub fn post(url: url::Url) -> Self {
        Self::new(http::Method::POST, url)
    }

    /// Sets a buffered, replayable request body.
    ///
    /// The buffer doubles as the [`BodySource`], so the request can be
    /// safely retried.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let bytes = body.into();
        self.body = Some(RequestBody::from_bytes(bytes.clone()));
        self.body_source = Some(BodySource::from_bytes(bytes));
        self
    }

    /// Sets a one-shot streaming body with no regeneration capability.
    ///
    /// A request built this way cannot be retried once its body has been
    /// consumed; pair it with [`Self::with_body_source`] when the stream
    /// can be recreated.
    #[must_use]
    pub fn with_streaming_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self.body_source = None;
        self
    }

    /// Attaches a body-regeneration capability.
    #[must_use]
    pub fn with_body_source(mut self, source: BodySource) -> Self {
        self.body_source = Some(source);
        self
    }

    /// Adds a header to the request.
    ///
    /// If the header name already exists, the value is appended
    /// (HTTP headers can have multiple values).
    #[must_use]
    pub fn with_header(mut self, name: http::HeaderName, value: http::HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Sets the deadline after which the request is abandoned.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline relative to now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }
}

/// A one-shot request body stream.
///
/// Reading the stream consumes it; a consumed body cannot be rewound.
/// Replay across retry attempts goes through [`BodySource`] instead.
pub struct RequestBody {
    stream: BoxStream<'static, io::Result<Bytes>>,
}

impl RequestBody {
    /// Creates a body from an in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            stream: futures_util::stream::once(async move { Ok(bytes) }).boxed(),
        }
    }

    /// Creates a body from an arbitrary byte stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
        }
    }

    /// Reads the entire body into memory, consuming the stream.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by the underlying stream.
    pub async fn bytes(mut self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(Bytes::from(buf))
    }

    pub(crate) fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.stream
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody").finish_non_exhaustive()
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        Self::from_bytes(text)
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(text)
    }
}

/// Capability producing a fresh, independently readable copy of a
/// request body.
///
/// Present on a request only when its body is replayable (e.g. it
/// originated from an in-memory buffer rather than a one-shot stream).
#[derive(Clone)]
pub struct BodySource(Arc<dyn Fn() -> io::Result<RequestBody> + Send + Sync>);

impl BodySource {
    /// Wraps an arbitrary regeneration function.
    pub fn new<F>(produce: F) -> Self
    where
        F: Fn() -> io::Result<RequestBody> + Send + Sync + 'static,
    {
        Self(Arc::new(produce))
    }

    /// Creates a source that replays an in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(move || Ok(RequestBody::from_bytes(bytes.clone())))
    }

    /// Produces a fresh copy of the body.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the regeneration function.
    pub fn produce(&self) -> io::Result<RequestBody> {
        (self.0)()
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodySource").finish_non_exhaustive()
    }
}

/// An HTTP response received from a server.
///
/// The body is a stream that must eventually be drained and closed by
/// whoever ends up owning the response, so the underlying connection is
/// released back to the pool.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: http::StatusCode,
    /// Response headers
    pub headers: http::HeaderMap,
    /// Response body stream
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Creates a new HTTP response.
    #[must_use]
    pub const fn new(status: http::StatusCode, headers: http::HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

type CloseFn = Box<dyn FnOnce() -> io::Result<()> + Send>;

/// A response body stream with explicit close semantics.
///
/// Transports that tie the body to a pooled connection install a close
/// hook; consumers must [`drain`](Self::drain) and [`close`](Self::close)
/// (or [`bytes`](Self::bytes)) any body they do not hand off, so the
/// connection is released deterministically.
pub struct ResponseBody {
    stream: BoxStream<'static, io::Result<Bytes>>,
    close: Option<CloseFn>,
}

impl ResponseBody {
    /// Creates an empty body.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            stream: futures_util::stream::empty().boxed(),
            close: None,
        }
    }

    /// Creates a body from an in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            stream: futures_util::stream::once(async move { Ok(bytes) }).boxed(),
            close: None,
        }
    }

    /// Creates a body from an arbitrary byte stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
            close: None,
        }
    }

    /// Installs a hook that runs when the body is closed.
    #[must_use]
    pub fn with_close<F>(mut self, close: F) -> Self
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        self.close = Some(Box::new(close));
        self
    }

    /// Reads the body to the end, discarding the content.
    ///
    /// Returns the number of bytes discarded.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by the underlying stream.
    pub async fn drain(&mut self) -> io::Result<u64> {
        let mut discarded = 0u64;
        while let Some(chunk) = self.stream.next().await {
            discarded += chunk?.len() as u64;
        }
        Ok(discarded)
    }

    /// Closes the body, running the close hook if one is installed.
    ///
    /// # Errors
    ///
    /// Returns the error reported by the close hook.
    pub fn close(mut self) -> io::Result<()> {
        self.close.take().map_or(Ok(()), |close| close())
    }

    /// Reads the entire body into memory, then closes it.
    ///
    /// # Errors
    ///
    /// Returns the first stream error, or the close hook's error after a
    /// complete read.
    pub async fn bytes(mut self) -> io::Result<Bytes> {
        let mut buf = Vec::new();
        while let Some(chunk) = self.stream.next().await {
            buf.extend_from_slice(&chunk?);
        }
        self.close()?;
        Ok(Bytes::from(buf))
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// Trait for sending HTTP requests.
///
/// # Design
///
/// This trait abstracts the HTTP transport implementation, enabling:
/// - Dependency injection for testing with mock transports
/// - Swapping HTTP libraries without changing calling code
/// - Adding cross-cutting concerns (retries, logging) via decorators
///   that implement the same trait and wrap an inner transport
pub trait Transport: Send + Sync {
    /// Sends an HTTP request and returns the response.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] when the request cannot be completed, e.g. on
    /// connection failure, timeout, or (for decorators) when the retry
    /// budget is exhausted.
    fn send(
        &self,
        req: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, Error>> + Send;
}
