//! Retry/backoff policy for artifact downloads.

use std::time::Duration;

/// Incremental backoff: the wait before retry `n` grows linearly from zero
/// and is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// How much each successive wait grows.
    pub increment: Duration,
    /// Upper bound for a single wait.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            increment: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            increment: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Set the number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Wait before the attempt that follows failed attempt `failed_attempt`
    /// (1-based): 0s, 2s, 4s, ... capped at `max_delay`.
    #[must_use]
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        self.increment
            .saturating_mul(failed_attempt.saturating_sub(1))
            .min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt` failed.
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        let waits: Vec<u64> = (1..policy.max_attempts)
            .map(|n| policy.delay_after(n).as_secs())
            .collect();
        assert_eq!(waits, vec![0, 2, 4, 6]);
        assert!(policy.should_retry(4));
        assert!(!policy.should_retry(5));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::default().with_max_attempts(40);
        assert_eq!(policy.delay_after(16), Duration::from_secs(30));
        assert_eq!(policy.delay_after(39), Duration::from_secs(30));
    }

    #[test]
    fn test_no_retry() {
        assert!(!RetryPolicy::no_retry().should_retry(1));
    }
}
