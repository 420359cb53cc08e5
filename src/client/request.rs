//! Fluent request builder with input validation.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::transport::{HttpRequest, RequestBody};

/// Maximum accepted `User-Agent` length.
const MAX_USER_AGENT_LEN: usize = 500;

/// Error returned by [`RequestBuilder::build`], listing every
/// validation failure accumulated while building.
#[derive(Debug, Error)]
#[error("invalid request: {}", .errors.join("; "))]
pub struct BuildError {
    errors: Vec<String>,
}

impl BuildError {
    /// Returns the individual validation failures.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

enum PendingBody {
    /// JSON-serialized payload; replayable.
    Json(Bytes),
    /// Raw buffered payload; replayable.
    Buffered(Bytes),
    /// One-shot stream; explicitly not replayable.
    Stream(RequestBody),
}

/// Fluent builder for [`HttpRequest`] values.
///
/// Invalid inputs do not abort the chain; they are accumulated and
/// reported together by [`build`](Self::build), so a caller wiring up a
/// request from configuration sees every problem at once.
///
/// # Example
///
/// ```
/// use httpkit::client::RequestBuilder;
///
/// let request = RequestBuilder::new("https://api.example.com")
///     .post()
///     .path("/v1/items")
///     .query_param("page", "2")
///     .bearer_auth("token")
///     .json(&serde_json::json!({"name": "example"}))
///     .build()
///     .unwrap();
/// assert_eq!(request.method, http::Method::POST);
/// ```
pub struct RequestBuilder {
    method: Option<http::Method>,
    base_url: String,
    path: Option<String>,
    query: Vec<(String, String)>,
    headers: http::HeaderMap,
    body: Option<PendingBody>,
    timeout: Option<Duration>,
    errors: Vec<String>,
}

impl RequestBuilder {
    /// Creates a builder targeting the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            method: None,
            base_url: base_url.into(),
            path: None,
            query: Vec::new(),
            headers: http::HeaderMap::new(),
            body: None,
            timeout: None,
            errors: Vec::new(),
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: http::Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the HTTP method to GET.
    #[must_use]
    pub fn get(self) -> Self {
        self.method(http::Method::GET)
    }

    /// Sets the HTTP method to POST.
    #[must_use]
    pub fn post(self) -> Self {
        self.method(http::Method::POST)
    }

    /// Sets the HTTP method to PUT.
    #[must_use]
    pub fn put(self) -> Self {
        self.method(http::Method::PUT)
    }

    /// Sets the HTTP method to DELETE.
    #[must_use]
    pub fn delete(self) -> Self {
        self.method(http::Method::DELETE)
    }

    /// Sets the HTTP method to PATCH.
    #[must_use]
    pub fn patch(self) -> Self {
        self.method(http::Method::PATCH)
    }

    /// Sets the HTTP method to HEAD.
    #[must_use]
    pub fn head(self) -> Self {
        self.method(http::Method::HEAD)
    }

    /// Sets the HTTP method to OPTIONS.
    #[must_use]
    pub fn options(self) -> Self {
        self.method(http::Method::OPTIONS)
    }

    /// Sets the path component appended to the base URL.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return self.with_error("query parameter key cannot be empty");
        }
        if value.is_empty() {
            return self.with_error(format!(
                "query parameter value for key '{key}' cannot be empty"
            ));
        }
        if key.contains([' ', '\t', '\n', '\r', '=', '&']) {
            return self.with_error(format!(
                "invalid query parameter key format: '{key}' (contains invalid characters)"
            ));
        }

        self.query.push((key, value));
        self
    }

    /// Adds multiple query parameters.
    #[must_use]
    pub fn query_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self = self.query_param(key, value);
        }
        self
    }

    /// Sets a single header, replacing any existing value for the name.
    #[must_use]
    pub fn header(mut self, key: &str, value: &str) -> Self {
        if key.is_empty() {
            return self.with_error("header key cannot be empty");
        }
        if value.is_empty() {
            return self.with_error(format!("header value for key '{key}' cannot be empty"));
        }
        if key.contains([' ', '\t', '\n', '\r']) {
            return self.with_error(format!(
                "invalid header key format: '{key}' (contains whitespace)"
            ));
        }

        let name = match http::HeaderName::try_from(key) {
            Ok(name) => name,
            Err(err) => return self.with_error(format!("invalid header name '{key}': {err}")),
        };
        let value = match http::HeaderValue::try_from(value) {
            Ok(value) => value,
            Err(err) => {
                return self.with_error(format!("invalid header value for '{key}': {err}"));
            }
        };

        self.headers.insert(name, value);
        self
    }

    /// Merges a prepared header map into the request.
    #[must_use]
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        for (name, value) in &headers {
            self.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Sets the `Authorization` header for basic authentication.
    #[must_use]
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        if username.is_empty() {
            return self.with_error("username for basic auth cannot be empty");
        }
        if password.is_empty() {
            return self.with_error("password for basic auth cannot be empty");
        }

        let credentials = STANDARD.encode(format!("{username}:{password}"));
        self.header("Authorization", &format!("Basic {credentials}"))
    }

    /// Sets the `Authorization` header for bearer token authentication.
    #[must_use]
    pub fn bearer_auth(self, token: &str) -> Self {
        if token.is_empty() {
            return self.with_error("bearer token cannot be empty");
        }

        self.header("Authorization", &format!("Bearer {token}"))
    }

    /// Sets the `User-Agent` header.
    ///
    /// The value is trimmed and validated: it must be non-empty after
    /// trimming, at most 500 characters, and free of control characters.
    #[must_use]
    pub fn user_agent(self, user_agent: &str) -> Self {
        let trimmed = user_agent.trim();
        if trimmed.is_empty() {
            return self.with_error("user-agent cannot be empty");
        }
        if trimmed.len() > MAX_USER_AGENT_LEN {
            return self.with_error(format!(
                "user-agent is too long (max {MAX_USER_AGENT_LEN} characters), got {} characters",
                trimmed.len()
            ));
        }
        if trimmed.contains(['\r', '\n', '\t']) {
            return self.with_error("user-agent cannot contain control characters");
        }

        let owned = trimmed.to_string();
        self.header("User-Agent", &owned)
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, content_type: &str) -> Self {
        self.header("Content-Type", content_type)
    }

    /// Sets the `Accept` header.
    #[must_use]
    pub fn accept(self, accept: &str) -> Self {
        self.header("Accept", accept)
    }

    /// Sets a JSON body and the matching `Content-Type` header.
    ///
    /// The payload is serialized once; the resulting buffer is
    /// replayable across retries.
    #[must_use]
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.body = Some(PendingBody::Json(Bytes::from(bytes)));
                self.content_type("application/json")
            }
            Err(err) => self.with_error(format!("failed to serialize JSON body: {err}")),
        }
    }

    /// Sets a plain-text body; replayable across retries.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(PendingBody::Buffered(Bytes::from(body.into())));
        self
    }

    /// Sets a raw byte body; replayable across retries.
    #[must_use]
    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(PendingBody::Buffered(body.into()));
        self
    }

    /// Sets a one-shot streaming body.
    ///
    /// Streaming bodies carry no regeneration capability, so a request
    /// built this way fails fast if the retry layer needs to replay it.
    #[must_use]
    pub fn streaming_body(mut self, body: RequestBody) -> Self {
        self.body = Some(PendingBody::Stream(body));
        self
    }

    /// Sets the per-request timeout, converted to a deadline at build
    /// time.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns true if any validation failure was accumulated so far.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] listing every accumulated validation
    /// failure, or the URL/method problems found during assembly.
    pub fn build(mut self) -> Result<HttpRequest, BuildError> {
        let url = self.assemble_url();

        if !self.errors.is_empty() {
            return Err(BuildError {
                errors: self.errors,
            });
        }

        let method = self
            .method
            .expect("method presence validated by assemble_url");
        let url = url.expect("url validity checked by assemble_url");

        let mut request = HttpRequest::new(method, url);
        request.headers = self.headers;

        match self.body {
            Some(PendingBody::Json(bytes) | PendingBody::Buffered(bytes)) => {
                request = request.with_body(bytes);
            }
            Some(PendingBody::Stream(body)) => {
                request = request.with_streaming_body(body);
            }
            None => {}
        }

        if let Some(timeout) = self.timeout {
            request = request.with_timeout(timeout);
        }

        Ok(request)
    }

    /// Parses the base URL, joins the path, and appends query
    /// parameters, accumulating any problems found.
    fn assemble_url(&mut self) -> Option<url::Url> {
        if self.method.is_none() {
            self.errors.push("HTTP method must be specified".to_string());
        }

        let mut url = match url::Url::parse(&self.base_url) {
            Ok(url) => url,
            Err(err) => {
                self.errors.push(format!("invalid base URL: {err}"));
                return None;
            }
        };

        if !matches!(url.scheme(), "http" | "https") {
            self.errors.push(format!(
                "unsupported url scheme: {} (only http and https are supported)",
                url.scheme()
            ));
            return None;
        }
        if url.host_str().is_none() {
            self.errors
                .push("base URL must include a host".to_string());
            return None;
        }

        if let Some(path) = &self.path {
            let joined = format!(
                "{}/{}",
                url.path().trim_end_matches('/'),
                path.trim_start_matches('/')
            );
            url.set_path(&joined);
        }

        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.query {
                pairs.append_pair(key, value);
            }
        }

        Some(url)
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
