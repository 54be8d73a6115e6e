use std::time::Duration;

/// Bound on attempts and backoff for one request.
///
/// `max_attempts` counts the initial attempt, so `retries = n` means `n + 1` attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
}

pub const DEFAULT_RETRIES: usize = 5;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRIES + 1,
            base_delay: Duration::from_millis(100),
            factor: 2.0,
            max_delay: Duration::from_secs(20),
        }
    }
}

impl RetryPolicy {
    pub fn from_retries(retries: usize) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Self::default()
        }
    }

    pub fn retries(&self) -> usize {
        self.max_attempts.saturating_sub(1)
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }
}

/// Throttling and server-side failures are worth another attempt; other 4xx are not.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}
