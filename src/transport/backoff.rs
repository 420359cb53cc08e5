//! Backoff strategies for computing inter-attempt retry delays.

use std::time::Duration;

use rand::Rng;

/// Default base delay for backoff strategies.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Default maximum delay for backoff strategies.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Strategy computing the delay before a retry, given the attempt index.
///
/// `attempt` is 0-indexed: 0 is the delay before the first retry, i.e.
/// after the initial attempt failed. All variants are pure functions of
/// the attempt index (modulo `Jitter`'s intentional randomness), hold no
/// mutable state, and are safe to share across concurrent requests.
///
/// # Example
///
/// ```
/// use httpkit::transport::Backoff;
/// use std::time::Duration;
///
/// let backoff = Backoff::Exponential {
///     base: Duration::from_millis(100),
///     max: Duration::from_secs(1),
/// };
/// assert_eq!(backoff.delay(0), Duration::from_millis(100));
/// assert_eq!(backoff.delay(3), Duration::from_millis(800));
/// assert_eq!(backoff.delay(10), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Constant delay for every retry, regardless of the attempt index.
    Fixed(Duration),

    /// `base * 2^attempt`, capped at `max`.
    ///
    /// When `base` exceeds `max`, attempt 0 still returns `base`
    /// uncapped, so the first retry always waits at least `base`;
    /// every subsequent attempt is capped at `max`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Cap applied to the computed delay.
        max: Duration,
    },

    /// Exponential backoff plus a uniformly random extra delay in
    /// `[0, value / 2)`, de-synchronizing retries across clients.
    Jitter {
        /// Delay before the first retry.
        base: Duration,
        /// Cap applied to the exponential component.
        max: Duration,
    },
}

impl Backoff {
    /// Computes the delay before retry number `attempt` (0-indexed).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { base, max } => exponential(base, max, attempt),
            Self::Jitter { base, max } => jitter(exponential(base, max, attempt)),
        }
    }
}

impl Default for Backoff {
    /// Exponential backoff from [`DEFAULT_BASE_DELAY`] capped at
    /// [`DEFAULT_MAX_DELAY`].
    fn default() -> Self {
        Self::Exponential {
            base: DEFAULT_BASE_DELAY,
            max: DEFAULT_MAX_DELAY,
        }
    }
}

fn exponential(base: Duration, max: Duration, attempt: u32) -> Duration {
    // The first retry always waits at least `base`, even past the cap;
    // growth is capped from the second retry onward.
    if attempt == 0 && base > max {
        return base;
    }

    match 1u32
        .checked_shl(attempt)
        .and_then(|factor| base.checked_mul(factor))
    {
        Some(delay) if !delay.is_zero() && delay <= max => delay,
        // Overflow and degenerate zero delays both clamp to the cap.
        _ => max,
    }
}

fn jitter(delay: Duration) -> Duration {
    let Ok(half) = u64::try_from((delay / 2).as_nanos()) else {
        return delay;
    };
    if half == 0 {
        return delay;
    }

    let extra = rand::thread_rng().gen_range(0..half);
    delay + Duration::from_nanos(extra)
}
