//! Retry policy with exponential backoff.

use std::time::Duration;

use crate::client::RawFailure;

/// Bounded retry budget.
///
/// The total number of attempts is `max_retries + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each retry after it
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `attempt` (1-indexed): `base * 2^(attempt-1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) - 1;
        self.base_delay.saturating_mul(2u32.saturating_pow(exponent))
    }

    /// Statuses below 500 are terminal. Failures without a status and 5xx
    /// responses may be retried.
    pub fn is_retryable(status: Option<u16>) -> bool {
        match status {
            Some(status) => status >= 500,
            None => true,
        }
    }

    /// Whether to try again after `failure`, given `retries_done` so far.
    pub fn should_retry(&self, failure: &RawFailure, retries_done: u32) -> bool {
        retries_done < self.max_retries && Self::is_retryable(failure.status())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert!(policy.delay(200) >= Duration::from_secs(1 << 31));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::is_retryable(None));
        assert!(RetryPolicy::is_retryable(Some(500)));
        assert!(RetryPolicy::is_retryable(Some(503)));
        assert!(!RetryPolicy::is_retryable(Some(404)));
        assert!(!RetryPolicy::is_retryable(Some(429)));
        assert!(!RetryPolicy::is_retryable(Some(200)));
    }

    #[test]
    fn test_budget() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let failure = RawFailure::Network {
            timed_out: true,
            message: String::new(),
        };
        assert!(policy.should_retry(&failure, 0));
        assert!(policy.should_retry(&failure, 1));
        assert!(!policy.should_retry(&failure, 2));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[test]
    fn test_client_error_never_retried() {
        let policy = RetryPolicy::default();
        let failure = RawFailure::Status {
            status: 404,
            message: String::new(),
        };
        assert!(!policy.should_retry(&failure, 0));
    }
}
