//! Reminder scheduling configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Controls when reminders fire and how the periodic sweeps run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// How long before an alert's due date its reminder fires.
    #[serde(default = "default_lead_interval")]
    pub lead_interval_seconds: u64,
    /// Cron expression (with seconds) for the reconciliation sweep.
    #[serde(default = "default_reconcile_cron")]
    pub reconcile_cron: String,
    /// Maximum alerts examined per reconciliation page.
    #[serde(default = "default_reconcile_batch")]
    pub reconcile_batch_size: u64,
    /// Cron expression (with seconds) for finished-job cleanup.
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,
    /// Completed and cancelled jobs older than this are purged.
    #[serde(default = "default_retention_days")]
    pub job_retention_days: i64,
}

impl ReminderConfig {
    /// Lead interval as a [`Duration`].
    pub fn lead_interval(&self) -> Duration {
        Duration::from_secs(self.lead_interval_seconds)
    }
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            lead_interval_seconds: default_lead_interval(),
            reconcile_cron: default_reconcile_cron(),
            reconcile_batch_size: default_reconcile_batch(),
            cleanup_cron: default_cleanup_cron(),
            job_retention_days: default_retention_days(),
        }
    }
}

fn default_lead_interval() -> u64 {
    24 * 60 * 60
}

fn default_reconcile_cron() -> String {
    "0 */10 * * * *".to_string()
}

fn default_reconcile_batch() -> u64 {
    100
}

fn default_cleanup_cron() -> String {
    "0 30 3 * * *".to_string()
}

fn default_retention_days() -> i64 {
    14
}
