//! Retry/backoff policy for transient ERP failures (`spec.md` §4.1).
//!
//! Three independent budgets apply depending on what failed: rate limit
//! (429), server error (5xx), and read timeout each have their own retry
//! ceiling, since the spec treats them differently.

use rand::Rng;
use suitebridge_config::RetryConfig;

/// Why a request is being retried, and therefore which budget governs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited,
    ServerError,
    ReadTimeout,
}

impl RetryReason {
    fn max_retries(&self, config: &RetryConfig) -> u32 {
        match self {
            Self::RateLimited => config.max_retries,
            Self::ServerError => config.max_retries.min(2),
            Self::ReadTimeout => 1,
        }
    }
}

/// Tracks the attempt count for one logical ERP call and computes the
/// exponential backoff delay (`initial * multiplier^attempt`, jittered by
/// ±`jitter_fraction`) for the next retry, if any remain.
pub struct RetryState<'a> {
    config: &'a RetryConfig,
    attempt: u32,
}

impl<'a> RetryState<'a> {
    pub fn new(config: &'a RetryConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Returns `Some(delay_ms)` if another attempt is permitted for
    /// `reason`, incrementing the internal attempt counter; `None` once
    /// the reason's budget is exhausted.
    pub fn next_delay_ms(&mut self, reason: RetryReason) -> Option<u64> {
        if self.attempt >= reason.max_retries(self.config) {
            return None;
        }
        let delay = self.backoff_delay_ms(self.attempt);
        self.attempt += 1;
        Some(delay)
    }

    pub fn attempts_made(&self) -> u32 {
        self.attempt
    }

    fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        let base = self.config.initial_backoff_ms as f64 * self.config.backoff_multiplier.powi(attempt as i32);
        let jitter_span = base * self.config.jitter_fraction;
        let jitter = rand::thread_rng().gen_range(-jitter_span..=jitter_span);
        (base + jitter).max(0.0) as u64
    }
}
