//! Attempt budget and delay strategy for fetch retries.

use shared::config::{ApiConfig, BackoffKind};
use std::time::Duration;

/// How many times a request is tried and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one (at least 1)
    pub max_attempts: u32,
    pub backoff: BackoffKind,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: BackoffKind, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
            base_delay,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.max_attempts, config.backoff, config.retry_delay())
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Immediate => Duration::ZERO,
            BackoffKind::Linear => self.base_delay.saturating_mul(attempt),
            BackoffKind::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, BackoffKind::Linear, Duration::from_secs(1))
    }
}
