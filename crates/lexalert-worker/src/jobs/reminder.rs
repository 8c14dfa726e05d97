//! Delivery of a single alert reminder.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use lexalert_database::{AlertStore, UserDirectory};
use lexalert_entity::alert::{Alert, AlertTransition};
use lexalert_entity::job::{Job, ReminderPayload, job_types};

use crate::executor::{JobExecutionError, JobHandler};
use crate::notifier::template::compose_reminder;
use crate::notifier::{Notifier, NotifyError};

/// Handles `alert_reminder` jobs: sends the email and expires overdue alerts.
#[derive(Debug)]
pub struct ReminderJobHandler {
    alerts: Arc<dyn AlertStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Arc<dyn Notifier>,
    send_timeout: Duration,
}

impl ReminderJobHandler {
    /// Create a new reminder job handler.
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Arc<dyn Notifier>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            alerts,
            users,
            notifier,
            send_timeout,
        }
    }

    /// The alert to remind about, or why this delivery should be skipped.
    fn deliverable(alert: Option<Alert>, payload: &ReminderPayload) -> Result<Alert, &'static str> {
        match alert {
            None => Err("alert_missing"),
            Some(alert) if alert.is_terminal() => Err("alert_closed"),
            Some(alert) if alert.due_date != Some(payload.due_date) => Err("superseded"),
            Some(alert) => Ok(alert),
        }
    }

    async fn deliver(&self, job: &Job, payload: &ReminderPayload) -> Result<(), JobExecutionError> {
        let contact = self
            .users
            .find_contact(payload.owner_id)
            .await?
            .ok_or_else(|| {
                JobExecutionError::Permanent(format!("Owner {} not found", payload.owner_id))
            })?;

        let message = compose_reminder(payload, &contact, job.id);
        match tokio::time::timeout(self.send_timeout, self.notifier.send(&message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(NotifyError::Transient(e))) => Err(JobExecutionError::Transient(e)),
            Ok(Err(NotifyError::Rejected(e))) => Err(JobExecutionError::Permanent(e)),
            Err(_) => Err(JobExecutionError::Transient(format!(
                "Send timed out after {}s",
                self.send_timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl JobHandler for ReminderJobHandler {
    fn job_type(&self) -> &str {
        job_types::ALERT_REMINDER
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: ReminderPayload = serde_json::from_value(job.payload.clone())
            .map_err(|e| JobExecutionError::Permanent(format!("Invalid reminder payload: {e}")))?;

        let found = self.alerts.find_by_id(payload.alert_id).await?;
        let alert = match Self::deliverable(found, &payload) {
            Ok(alert) => alert,
            Err(reason) => {
                info!(job_id = %job.id, alert_id = %payload.alert_id, reason, "Reminder skipped");
                return Ok(Some(json!({"sent": false, "expired": false, "skipped": reason})));
            }
        };

        let already_sent = alert.reminder_sent_by(job.id);
        if already_sent {
            debug!(job_id = %job.id, alert_id = %alert.id, "Reminder already delivered by this job");
        } else {
            self.deliver(job, &payload).await?;
            let recorded = self
                .alerts
                .record_reminder_sent(alert.id, job.id, Utc::now())
                .await?;
            if !recorded {
                warn!(alert_id = %alert.id, "Alert vanished before the send was recorded");
            }
            info!(
                job_id = %job.id,
                alert_id = %alert.id,
                owner_id = %payload.owner_id,
                "Reminder sent"
            );
        }

        let mut expired = false;
        if alert.is_overdue(Utc::now()) {
            expired = self
                .alerts
                .transition_status(alert.id, None, AlertTransition::Expire, None)
                .await?
                .is_some();
            if expired {
                info!(alert_id = %alert.id, "Alert expired");
            }
        }

        Ok(Some(json!({
            "sent": !already_sent,
            "already_sent": already_sent,
            "expired": expired,
        })))
    }
}
