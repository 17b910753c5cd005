//! Circuit breaker for feed rate limiting and IP bans.
//!
//! When the provider returns HTTP 403 (IP ban) or repeated 429 (rate limit),
//! the breaker trips and refuses every later request until the cooldown
//! (default 30 minutes) has passed.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// State of the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Requests are allowed.
    Closed,
    /// Tripped; requests are refused until cooldown expires.
    Open { tripped_at: Instant },
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
}

/// Prevents hammering a provider after a ban or rate limit.
///
/// Shared between rayon workers, so state sits behind one mutex.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: 3,
        }
    }

    /// 30-minute cooldown, trips after 3 consecutive failures.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        // A poisoned lock only means another worker panicked mid-update;
        // the counters are still usable.
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn is_allowed(&self) -> bool {
        let cooldown = self.cooldown;
        self.with_inner(|inner| match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open { tripped_at } => {
                if tripped_at.elapsed() >= cooldown {
                    inner.state = BreakerState::Closed;
                    inner.consecutive_failures = 0;
                    true
                } else {
                    false
                }
            }
        })
    }

    /// Resets the failure counter.
    pub fn record_success(&self) {
        self.with_inner(|inner| inner.consecutive_failures = 0);
    }

    /// Counts a failure and trips once the threshold is reached.
    pub fn record_failure(&self) {
        let threshold = self.failure_threshold;
        self.with_inner(|inner| {
            inner.consecutive_failures += 1;
            if inner.consecutive_failures >= threshold {
                inner.state = BreakerState::Open {
                    tripped_at: Instant::now(),
                };
            }
        });
    }

    /// Immediately trip the breaker (403 Forbidden / IP ban).
    pub fn trip(&self) {
        self.with_inner(|inner| {
            inner.state = BreakerState::Open {
                tripped_at: Instant::now(),
            }
        });
    }

    /// Remaining cooldown time (zero if not tripped).
    pub fn remaining_cooldown(&self) -> Duration {
        let cooldown = self.cooldown;
        self.with_inner(|inner| match inner.state {
            BreakerState::Closed => Duration::ZERO,
            BreakerState::Open { tripped_at } => cooldown.saturating_sub(tripped_at.elapsed()),
        })
    }
}
