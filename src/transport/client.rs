//! Production transport implementation using reqwest.

use std::io;

use futures_util::StreamExt;
use tokio::time::Instant;

use super::http::{HttpRequest, HttpResponse, ResponseBody, Transport};
use super::Error;

/// Production transport using reqwest.
///
/// This is a thin wrapper around `reqwest::Client` that implements the
/// [`Transport`] trait. It inherits reqwest's default configuration
/// including connection pooling; pool tuning happens in the client
/// assembly layer.
///
/// # Example
///
/// ```no_run
/// use httpkit::transport::{HttpRequest, ReqwestTransport, Transport};
/// use url::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = ReqwestTransport::new();
/// let url = Url::parse("https://api.example.com/items")?;
/// let response = transport.send(HttpRequest::get(url)).await?;
/// println!("Status: {}", response.status);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a new transport with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Creates a transport from an existing reqwest client.
    ///
    /// Useful when you need custom configuration (pooling, proxy, TLS).
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        // Build the reqwest request
        let mut builder = self.inner.request(req.method, req.url.as_str());

        // Add headers
        for (name, value) in &req.headers {
            builder = builder.header(name, value);
        }

        // Bound this attempt by the request deadline
        if let Some(deadline) = req.deadline {
            builder = builder.timeout(deadline.saturating_duration_since(Instant::now()));
        }

        // Add body if present
        if let Some(body) = req.body {
            builder = builder.body(reqwest::Body::wrap_stream(body.into_stream()));
        }

        // Send the request
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else if e.is_builder() {
                Error::InvalidUrl(e.to_string())
            } else {
                Error::Connection(Box::new(e))
            }
        })?;

        // Extract response parts; the body stays streaming so callers
        // (and the retry layer) control draining and closing.
        let status = response.status();
        let headers = response.headers().clone();
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other));

        Ok(HttpResponse::new(
            status,
            headers,
            ResponseBody::from_stream(stream),
        ))
    }
}
