//! Reminder scheduling: turns an alert's due date into a queued delivery.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use lexalert_core::result::AppResult;
use lexalert_entity::alert::Alert;
use lexalert_entity::job::{Job, ReminderPayload, job_types, queues, reminder_dedup_key};

use crate::queue::{JobCreateParams, JobQueue};

/// Schedules one reminder job per alert, `lead` ahead of its due date.
#[derive(Debug, Clone)]
pub struct ReminderScheduler {
    queue: Arc<JobQueue>,
    lead: Duration,
}

impl ReminderScheduler {
    /// Create a scheduler that fires reminders `lead` before the due date.
    pub fn new(queue: Arc<JobQueue>, lead: std::time::Duration) -> Self {
        Self {
            queue,
            lead: Duration::from_std(lead).unwrap_or_else(|_| Duration::hours(24)),
        }
    }

    /// The configured lead interval.
    pub fn lead(&self) -> Duration {
        self.lead
    }

    /// When a reminder for `due_date` should fire, never earlier than `now`.
    pub fn fire_at(&self, due_date: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
        (due_date - self.lead).max(now)
    }

    /// Schedule the reminder for `alert`, replacing any pending one.
    ///
    /// Returns `None` when the alert has no due date or is already closed.
    pub async fn schedule(&self, alert: &Alert) -> AppResult<Option<Job>> {
        self.schedule_at(alert, Utc::now()).await
    }

    /// [`Self::schedule`] with an explicit clock.
    pub async fn schedule_at(&self, alert: &Alert, now: DateTime<Utc>) -> AppResult<Option<Job>> {
        let Some(due_date) = alert.due_date else {
            debug!(alert_id = %alert.id, "No due date, nothing to schedule");
            return Ok(None);
        };
        if !alert.in_reminder_pipeline() {
            debug!(alert_id = %alert.id, status = %alert.status, "Alert closed, nothing to schedule");
            return Ok(None);
        }

        let payload = ReminderPayload {
            alert_id: alert.id,
            owner_id: alert.owner_id,
            title: alert.title.clone(),
            due_date,
        };
        let payload_json = serde_json::to_value(&payload)?;

        let fire_at = self.fire_at(due_date, now);
        let mut params =
            JobCreateParams::new(job_types::ALERT_REMINDER, queues::REMINDERS, payload_json);
        params.dedup_key = Some(payload.dedup_key());
        params.deliver_at = Some(fire_at);

        let job = self.queue.enqueue(params).await?;
        info!(
            alert_id = %alert.id,
            job_id = %job.id,
            fire_at = %fire_at,
            "Reminder scheduled"
        );
        Ok(Some(job))
    }

    /// Cancel the pending reminder for an alert. No-op when there is none.
    pub async fn cancel(&self, alert_id: Uuid) -> AppResult<u64> {
        let cancelled = self.queue.cancel_by_key(&reminder_dedup_key(alert_id)).await?;
        if cancelled > 0 {
            info!(alert_id = %alert_id, "Reminder cancelled");
        }
        Ok(cancelled)
    }

    /// The newest reminder job ever enqueued for an alert, in any status.
    pub async fn latest_job(&self, alert_id: Uuid) -> AppResult<Option<Job>> {
        self.queue
            .find_latest_by_key(&reminder_dedup_key(alert_id))
            .await
    }
}
