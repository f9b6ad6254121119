use std::time::Duration;

/// Retry ceiling for attachment downloads.
pub const DEFAULT_MAX_FAILURE_COUNT: u32 = 20;

/// Owner-side retry budget.
///
/// The owner increments its failure count after every retryable failure and
/// re-invokes the job while `should_retry` holds. Once the budget is spent the
/// job is treated as permanently failed, even though every single attempt only
/// reported a retryable failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_failure_count: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_failure_count: u32, backoff: Duration) -> Self {
        Self {
            max_failure_count,
            backoff,
        }
    }

    /// `failure_count` is the number of retryable failures observed so far.
    pub fn should_retry(&self, failure_count: u32) -> bool {
        failure_count < self.max_failure_count
    }

    /// Linear backoff before the next attempt.
    pub fn backoff_for(&self, failure_count: u32) -> Duration {
        self.backoff.saturating_mul(failure_count.max(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_failure_count: DEFAULT_MAX_FAILURE_COUNT,
            backoff: Duration::from_secs(1),
        }
    }
}
