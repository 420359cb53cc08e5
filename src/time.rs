//! Time abstraction for testability.
//!
//! This module provides a [`Sleeper`] trait that allows injecting
//! instant-return sleepers in tests while using real tokio timers in
//! production.

use std::time::Duration;

/// Abstraction over delaying execution for testability.
///
/// Implementations suspend the calling task for the requested duration,
/// allowing tests to skip real delays entirely.
///
/// # Example
///
/// ```
/// use httpkit::time::{Sleeper, TokioSleeper};
/// use std::time::Duration;
///
/// # async fn example() {
/// let sleeper = TokioSleeper;
/// sleeper.sleep(Duration::from_millis(1)).await;
/// # }
/// ```
pub trait Sleeper: Send + Sync {
    /// Suspends the current task for the given duration.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately, ignoring the requested duration.
///
/// Useful in tests exercising retry loops without waiting out real
/// backoff delays.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
