//! Client assembly layer: configuration, fluent request building, and
//! typed JSON responses.
//!
//! This module provides:
//! - Bounds-checked client configuration ([`ClientBuilder`], [`Strategy`])
//! - Fluent request building with validation ([`RequestBuilder`])
//! - A typed client decoding JSON responses ([`Client`], [`Response`])
//! - API error payloads ([`ErrorResponse`])

mod builder;
mod request;
mod typed;

#[cfg(test)]
mod typed_tests;

pub use builder::{ClientBuilder, Strategy, UnknownStrategy};
pub use request::{BuildError, RequestBuilder};
pub use typed::{Client, ClientError, ErrorResponse, Response};
