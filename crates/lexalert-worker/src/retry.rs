//! Retry policy with capped exponential backoff.

use chrono::Duration;

use lexalert_core::config::RetryConfig;

/// How many times a job may run and how long to wait between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before a job is dead-lettered.
    pub max_attempts: i32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the run following failed attempt `attempt` (1-based):
    /// `min(base * 2^(attempt - 1), max)`.
    pub fn delay_for(&self, attempt: i32) -> Duration {
        let exponent = attempt.saturating_sub(1).clamp(0, 30) as u32;
        let factor = 2_i64.saturating_pow(exponent);
        let base_ms = self.base_delay.num_milliseconds();
        let delay = Duration::milliseconds(base_ms.saturating_mul(factor));
        delay.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::seconds(config.base_delay_seconds as i64),
            max_delay: Duration::seconds(config.max_delay_seconds as i64),
        }
    }
}
