//! Background worker and retry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Background job worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the worker runs inside the server process.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Number of concurrent job processing tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Interval in seconds between job queue polls when idle.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// How long a claimed job stays invisible to other workers.
    /// A job whose lease expires is delivered again.
    #[serde(default = "default_lease")]
    pub lease_seconds: u64,
    /// Upper bound on waiting for in-flight jobs at shutdown.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl WorkerConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Lease length as a [`Duration`].
    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.lease_seconds)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: default_concurrency(),
            poll_interval_seconds: default_poll_interval(),
            lease_seconds: default_lease(),
            shutdown_grace_seconds: default_shutdown_grace(),
            retry: RetryConfig::default(),
        }
    }
}

/// Bounded exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total delivery attempts before a job is dead-lettered.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Delay after the first failed attempt.
    #[serde(default = "default_base_delay")]
    pub base_delay_seconds: u64,
    /// Ceiling for any single delay.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_seconds: default_base_delay(),
            max_delay_seconds: default_max_delay(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    4
}

fn default_poll_interval() -> u64 {
    5
}

fn default_lease() -> u64 {
    120
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_max_attempts() -> i32 {
    5
}

fn default_base_delay() -> u64 {
    30
}

fn default_max_delay() -> u64 {
    3600
}
