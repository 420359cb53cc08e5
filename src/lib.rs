//! httpkit: HTTP client convenience toolkit
//!
//! A library layering a fluent request builder, a typed JSON client, and a
//! retrying transport with pluggable backoff over reqwest.

pub mod client;
pub mod time;
pub mod transport;
