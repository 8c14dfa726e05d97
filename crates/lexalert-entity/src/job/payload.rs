//! Job type identifiers, queue names and typed payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job type identifiers.
pub mod job_types {
    /// Deliver one alert reminder.
    pub const ALERT_REMINDER: &str = "alert_reminder";
    /// Re-schedule reminders whose enqueue was lost.
    pub const REMINDER_RECONCILE: &str = "reminder_reconcile";
    /// Purge old finished jobs.
    pub const JOB_CLEANUP: &str = "job_cleanup";
}

/// Queue names.
pub mod queues {
    /// Reminder deliveries.
    pub const REMINDERS: &str = "reminders";
    /// Periodic housekeeping.
    pub const MAINTENANCE: &str = "maintenance";

    /// Every queue a worker polls by default.
    pub const ALL: [&str; 2] = [REMINDERS, MAINTENANCE];
}

/// Payload of an `alert_reminder` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderPayload {
    /// Alert to remind about.
    pub alert_id: Uuid,
    /// Owner to notify.
    pub owner_id: Uuid,
    /// Alert title at scheduling time.
    pub title: String,
    /// Due date at scheduling time; a mismatch means the job was superseded.
    pub due_date: DateTime<Utc>,
}

impl ReminderPayload {
    /// The dedup key for this payload's alert.
    pub fn dedup_key(&self) -> String {
        reminder_dedup_key(self.alert_id)
    }
}

/// Payload of a `reminder_reconcile` job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilePayload {
    /// Override for the configured batch size.
    #[serde(default)]
    pub batch_size: Option<u32>,
}

/// Payload of a `job_cleanup` job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupPayload {
    /// Override for the configured retention window.
    #[serde(default)]
    pub retention_days: Option<u32>,
}

/// Dedup key of the reminder job for `alert_id`.
pub fn reminder_dedup_key(alert_id: Uuid) -> String {
    format!("reminder:{alert_id}")
}
