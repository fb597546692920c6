//! Retry logic for admin API calls.
//!
//! # Responsibilities
//! - Decide whether a failed call is worth another attempt
//! - Bound the number of attempts
//! - Space attempts with exponential backoff + jitter
//!
//! # Design Decisions
//! - Connection errors, 429 and 5xx are retried
//! - Any other status is a definitive answer (404 means "absent")
//! - Every admin write is a full replace or a merge patch, so repeating it
//!   is safe

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::AdminClientConfig;
use crate::resilience::backoff::calculate_backoff;

/// Bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &AdminClientConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_wait_ms),
            max_delay: Duration::from_millis(config.retry_max_wait_ms),
        }
    }

    /// True if another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait after attempt number `attempt` failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.base_delay.as_millis() as u64,
            self.max_delay.as_millis() as u64,
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&AdminClientConfig::default())
    }
}

/// Check if a response status warrants a retry.
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
