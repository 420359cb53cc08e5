//! Bounds-checked configuration builder for assembling a [`Client`].

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::transport::{Backoff, ReqwestTransport, RetryObserver, RetryTransport};

use super::typed::{Client, ClientError};

/// Retry strategy selector.
///
/// A string-convertible tag so configuration layers can pick a
/// [`Backoff`] variant without constructing one directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Constant delay between retries.
    Fixed,
    /// Exponentially growing delay, capped.
    Exponential,
    /// Exponential delay with random jitter.
    Jitter,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fixed => "fixed",
            Self::Exponential => "exponential",
            Self::Jitter => "jitter",
        };
        f.write_str(name)
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "exponential" => Ok(Self::Exponential),
            "jitter" => Ok(Self::Jitter),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown retry strategy: {0}")]
pub struct UnknownStrategy(String);

/// Builder for creating a [`Client`] with validated settings.
///
/// Every option has a valid range; out-of-range values are replaced by
/// the default at [`build`](Self::build) time with a structured warning,
/// never an error. The overall timeout bounds the entire retry sequence
/// of each request, not individual attempts.
///
/// # Example
///
/// ```no_run
/// use httpkit::client::{ClientBuilder, Strategy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), httpkit::client::ClientError> {
/// let client = ClientBuilder::new()
///     .with_timeout(Duration::from_secs(10))
///     .with_max_retries(5)
///     .with_retry_strategy(Strategy::Jitter)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    timeout: Duration,
    connect_timeout: Duration,
    pool_max_idle_per_host: usize,
    pool_idle_timeout: Duration,
    disable_keep_alive: bool,
    max_retries: u32,
    retry_base_delay: Duration,
    retry_max_delay: Duration,
    strategy: Strategy,
    proxy_url: Option<String>,
    observer: Option<Arc<dyn RetryObserver>>,
}

impl ClientBuilder {
    /// Default overall request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
    /// Valid range for the overall request timeout.
    pub const TIMEOUT_RANGE: (Duration, Duration) =
        (Duration::from_secs(1), Duration::from_secs(30));

    /// Default connect timeout.
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    /// Valid range for the connect timeout.
    pub const CONNECT_TIMEOUT_RANGE: (Duration, Duration) =
        (Duration::from_secs(1), Duration::from_secs(15));

    /// Default maximum number of idle pooled connections per host.
    pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 100;
    /// Valid range for idle pooled connections per host.
    pub const POOL_MAX_IDLE_PER_HOST_RANGE: (usize, usize) = (1, 200);

    /// Default idle connection timeout.
    pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
    /// Valid range for the idle connection timeout.
    pub const POOL_IDLE_TIMEOUT_RANGE: (Duration, Duration) =
        (Duration::from_secs(1), Duration::from_secs(120));

    /// Default number of retry attempts beyond the first.
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    /// Valid range for retry attempts.
    pub const MAX_RETRIES_RANGE: (u32, u32) = (1, 10);

    /// Default base delay for backoff strategies.
    pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
    /// Valid range for the backoff base delay.
    pub const RETRY_BASE_DELAY_RANGE: (Duration, Duration) =
        (Duration::from_millis(300), Duration::from_secs(5));

    /// Default maximum delay for backoff strategies.
    pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(10);
    /// Valid range for the backoff maximum delay.
    pub const RETRY_MAX_DELAY_RANGE: (Duration, Duration) =
        (Duration::from_millis(300), Duration::from_secs(120));

    /// Creates a builder with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            pool_max_idle_per_host: Self::DEFAULT_POOL_MAX_IDLE_PER_HOST,
            pool_idle_timeout: Self::DEFAULT_POOL_IDLE_TIMEOUT,
            disable_keep_alive: false,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry_base_delay: Self::DEFAULT_RETRY_BASE_DELAY,
            retry_max_delay: Self::DEFAULT_RETRY_MAX_DELAY,
            strategy: Strategy::Exponential,
            proxy_url: None,
            observer: None,
        }
    }

    /// Sets the overall per-request timeout.
    ///
    /// The timeout bounds the whole retry sequence, including backoff
    /// delays, not each individual attempt.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the connect timeout for new connections.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum number of idle pooled connections per host.
    #[must_use]
    pub const fn with_pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Sets how long idle pooled connections are kept around.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Disables connection reuse entirely.
    #[must_use]
    pub const fn with_disable_keep_alive(mut self, disable: bool) -> Self {
        self.disable_keep_alive = disable;
        self
    }

    /// Sets the number of retry attempts beyond the first.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the base delay for the retry backoff.
    #[must_use]
    pub const fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Sets the maximum delay for the retry backoff.
    #[must_use]
    pub const fn with_retry_max_delay(mut self, delay: Duration) -> Self {
        self.retry_max_delay = delay;
        self
    }

    /// Sets the retry strategy.
    #[must_use]
    pub const fn with_retry_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the retry strategy from a string.
    ///
    /// Valid values: `"fixed"`, `"jitter"`, `"exponential"`. Invalid
    /// values fall back to exponential with a warning.
    #[must_use]
    pub fn with_retry_strategy_str(mut self, strategy: &str) -> Self {
        self.strategy = strategy.parse().unwrap_or_else(|err: UnknownStrategy| {
            tracing::warn!(%err, default = %Strategy::Exponential, "using default retry strategy");
            Strategy::Exponential
        });
        self
    }

    /// Sets a proxy URL for all requests.
    ///
    /// The URL should look like `http://proxy.example.com:8080`. A URL
    /// that fails to parse at build time is skipped with a warning.
    #[must_use]
    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    /// Installs an observer for retry events.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Builds the client, clamping out-of-range options to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Connector`] if the underlying HTTP
    /// connector cannot be initialized.
    pub fn build(self) -> Result<Client, ClientError> {
        let timeout = validated(
            self.timeout,
            Self::TIMEOUT_RANGE,
            Self::DEFAULT_TIMEOUT,
            "timeout",
        );
        let connect_timeout = validated(
            self.connect_timeout,
            Self::CONNECT_TIMEOUT_RANGE,
            Self::DEFAULT_CONNECT_TIMEOUT,
            "connect_timeout",
        );
        let pool_max_idle_per_host = validated(
            self.pool_max_idle_per_host,
            Self::POOL_MAX_IDLE_PER_HOST_RANGE,
            Self::DEFAULT_POOL_MAX_IDLE_PER_HOST,
            "pool_max_idle_per_host",
        );
        let pool_idle_timeout = validated(
            self.pool_idle_timeout,
            Self::POOL_IDLE_TIMEOUT_RANGE,
            Self::DEFAULT_POOL_IDLE_TIMEOUT,
            "pool_idle_timeout",
        );
        let max_retries = validated(
            self.max_retries,
            Self::MAX_RETRIES_RANGE,
            Self::DEFAULT_MAX_RETRIES,
            "max_retries",
        );
        let base = validated(
            self.retry_base_delay,
            Self::RETRY_BASE_DELAY_RANGE,
            Self::DEFAULT_RETRY_BASE_DELAY,
            "retry_base_delay",
        );
        let max = validated(
            self.retry_max_delay,
            Self::RETRY_MAX_DELAY_RANGE,
            Self::DEFAULT_RETRY_MAX_DELAY,
            "retry_max_delay",
        );

        let backoff = match self.strategy {
            Strategy::Fixed => Backoff::Fixed(base),
            Strategy::Exponential => Backoff::Exponential { base, max },
            Strategy::Jitter => Backoff::Jitter { base, max },
        };

        let mut builder = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(pool_idle_timeout)
            .pool_max_idle_per_host(if self.disable_keep_alive {
                0
            } else {
                pool_max_idle_per_host
            });

        if let Some(raw) = self.proxy_url {
            match reqwest::Proxy::all(&raw) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(err) => {
                    tracing::warn!(proxy_url = %raw, %err, "failed to parse proxy URL, proceeding without proxy");
                }
            }
        }

        let inner = builder
            .build()
            .map_err(|e| ClientError::Connector(Box::new(e)))?;

        let mut transport = RetryTransport::new(
            ReqwestTransport::from_client(inner),
            max_retries,
            backoff,
        );
        if let Some(observer) = self.observer {
            transport = transport.with_observer(observer);
        }

        Ok(Client::from_parts(transport, timeout))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("pool_idle_timeout", &self.pool_idle_timeout)
            .field("disable_keep_alive", &self.disable_keep_alive)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("retry_max_delay", &self.retry_max_delay)
            .field("strategy", &self.strategy)
            .field("proxy_url", &self.proxy_url)
            .finish_non_exhaustive()
    }
}

/// Replaces an out-of-range value with its default, warning about it.
fn validated<T>(value: T, (min, max): (T, T), default: T, option: &str) -> T
where
    T: PartialOrd + fmt::Debug + Copy,
{
    if value < min || value > max {
        tracing::warn!(
            option,
            value = ?value,
            default = ?default,
            "option out of valid range, using default"
        );
        default
    } else {
        value
    }
}
