//! Per-call retry budget.

use std::time::{Duration, Instant};

/// Retry settings shared by every call of one client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Attempts per call, including the first one.
    pub max_retries: u32,
    /// Base of the backoff, in seconds. Attempt `n` (0-based) waits
    /// `backoff_factor * 2^n` before the next one.
    pub backoff_factor: f64,
    /// Wall-clock limit of one call, measured from its first attempt.
    pub overall_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 0.5,
            overall_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Start the clock for one call.
    pub fn begin(&self) -> RetryBudget {
        RetryBudget {
            policy: *self,
            start_time: Instant::now(),
        }
    }
}

/// Budget of one in-flight call. Dropped when the call resolves.
#[derive(Debug, Clone, Copy)]
pub struct RetryBudget {
    policy: RetryPolicy,
    start_time: Instant,
}

impl RetryBudget {
    /// Attempts allowed; never less than one.
    pub fn attempts(&self) -> u32 {
        self.policy.max_retries.max(1)
    }

    /// Time spent since the call started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// True once the overall timeout has been reached.
    pub fn exhausted(&self) -> bool {
        self.elapsed() >= self.policy.overall_timeout
    }

    /// Wait after failed attempt `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.policy.backoff_factor * 2f64.powi(exp);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}
