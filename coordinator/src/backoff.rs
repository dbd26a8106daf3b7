//! Reconnect backoff policy.
//!
//! Kept as a plain value decoupled from real timers so tests can walk
//! through many attempts without waiting: the delay grows linearly with the
//! attempt number, and the policy reports exhaustion once the attempt cap
//! is spent.

use std::time::Duration;

/// Default base delay unit between reconnect attempts.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Default cap on automatic reconnect attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Linear backoff: attempt `n` waits `base × n`, up to `max_attempts`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS)
    }
}

impl BackoffPolicy {
    #[must_use]
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self { base, max_attempts }
    }

    /// Delay before the given 1-based attempt, or `None` once the cap is
    /// spent (automatic reconnection must stop until a manual connect).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        Some(self.base.saturating_mul(attempt))
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[cfg(test)]
#[path = "backoff_test.rs"]
mod tests;
