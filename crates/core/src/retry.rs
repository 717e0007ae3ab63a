//! Bounded retry with linear backoff for batch failures.
//!
//! A batch that fails (lock timeout, deadlock, dropped connection) is
//! retried after `backoff_step × consecutive_failures`. Once the number of
//! consecutive failures exceeds the limit the run is abandoned. Any
//! successful batch resets the count.

use std::time::Duration;

/// Consecutive failures tolerated before a run is abandoned.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Backoff added per consecutive failure.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_consecutive_failures: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `failures`-th consecutive failure.
    pub fn backoff_for(&self, failures: u32) -> Duration {
        self.backoff_step * failures
    }

    /// Whether `failures` consecutive failures exhaust the budget.
    pub fn is_exhausted(&self, failures: u32) -> bool {
        failures > self.max_consecutive_failures
    }
}

/// What to do after a failed batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try the same batch again.
    Retry(Duration),
    /// Give up on the run.
    Abort,
}

/// Tracks consecutive failures for one run.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    consecutive: u32,
    total: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            consecutive: 0,
            total: 0,
        }
    }

    /// Record a failed batch and decide whether to retry.
    pub fn record_failure(&mut self) -> RetryDecision {
        self.consecutive += 1;
        self.total += 1;
        if self.policy.is_exhausted(self.consecutive) {
            RetryDecision::Abort
        } else {
            RetryDecision::Retry(self.policy.backoff_for(self.consecutive))
        }
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive
    }

    /// All failures seen during the run, including retried ones.
    pub fn total_failures(&self) -> u32 {
        self.total
    }
}
