//! Transport layer for sending HTTP requests with retries.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`]) with replayable bodies
//!   ([`BodySource`])
//! - Handling HTTP responses ([`HttpResponse`], [`ResponseBody`])
//! - Abstracting HTTP transports ([`Transport`])
//! - Production transport implementation ([`ReqwestTransport`])
//! - Retrying decoration with backoff ([`RetryTransport`], [`Backoff`])
//! - Retry observability ([`RetryObserver`], [`TracingObserver`])

mod backoff;
mod client;
mod error;
mod http;
mod retry;

#[cfg(test)]
mod client_tests;
#[cfg(test)]
mod error_tests;

pub use backoff::{Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY};
pub use client::ReqwestTransport;
pub use error::{AttemptFailure, Error};
pub use http::{BodySource, HttpRequest, HttpResponse, RequestBody, ResponseBody, Transport};
pub use retry::{RetryEvent, RetryObserver, RetryTransport, TracingObserver};
