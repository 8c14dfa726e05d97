//! Reminder reconciliation: re-schedules reminders whose enqueue was lost.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use lexalert_core::error::AppError;
use lexalert_core::result::AppResult;
use lexalert_database::AlertStore;
use lexalert_entity::job::{Job, JobStatus, ReconcilePayload, job_types};

use crate::executor::{JobExecutionError, JobHandler};
use crate::reminder::ReminderScheduler;

/// Summary of one reconciliation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Alerts examined.
    pub examined: u64,
    /// Reminders scheduled.
    pub scheduled: u64,
    /// Alerts left alone because their last reminder was dead-lettered.
    pub dead_lettered: u64,
}

/// Finds open alerts with a due date and no reminder job, and schedules one.
///
/// An alert whose latest reminder job is dead stays dead until an operator
/// retries the job or the alert's due date changes.
#[derive(Debug, Clone)]
pub struct Reconciler {
    alerts: Arc<dyn AlertStore>,
    scheduler: ReminderScheduler,
    batch_size: u32,
}

impl Reconciler {
    /// Create a reconciler reading `batch_size` alerts per page.
    pub fn new(alerts: Arc<dyn AlertStore>, scheduler: ReminderScheduler, batch_size: u32) -> Self {
        Self {
            alerts,
            scheduler,
            batch_size: batch_size.max(1),
        }
    }

    /// Run one sweep over every alert awaiting a reminder.
    pub async fn run(&self, batch_size: Option<u32>) -> AppResult<ReconcileReport> {
        let batch_size = batch_size.unwrap_or(self.batch_size).max(1);
        let mut report = ReconcileReport::default();
        let mut cursor = None;

        loop {
            let page = self.alerts.find_awaiting_reminder(cursor, batch_size).await?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id);
            let full_page = page.len() as u32 == batch_size;

            for alert in &page {
                report.examined += 1;
                match self.scheduler.latest_job(alert.id).await? {
                    Some(job) if job.status.is_active() => continue,
                    Some(job) if job.status == JobStatus::Dead => {
                        debug!(
                            alert_id = %alert.id,
                            job_id = %job.id,
                            "Reminder dead-lettered, not rescheduling"
                        );
                        report.dead_lettered += 1;
                        continue;
                    }
                    _ => {}
                }
                match self.scheduler.schedule(alert).await {
                    Ok(Some(_)) => report.scheduled += 1,
                    Ok(None) => {}
                    Err(e) => {
                        warn!(alert_id = %alert.id, error = %e, "Failed to reschedule reminder");
                    }
                }
            }

            if !full_page {
                break;
            }
        }

        info!(
            examined = report.examined,
            scheduled = report.scheduled,
            dead_lettered = report.dead_lettered,
            "Reminder reconciliation finished"
        );
        Ok(report)
    }
}

/// Handles `reminder_reconcile` jobs.
#[derive(Debug)]
pub struct ReconcileJobHandler {
    reconciler: Arc<Reconciler>,
}

impl ReconcileJobHandler {
    /// Create a new reconcile job handler.
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self { reconciler }
    }
}

#[async_trait]
impl JobHandler for ReconcileJobHandler {
    fn job_type(&self) -> &str {
        job_types::REMINDER_RECONCILE
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: ReconcilePayload = serde_json::from_value(job.payload.clone())
            .map_err(|e| JobExecutionError::Permanent(format!("Invalid reconcile payload: {e}")))?;
        let report = self.reconciler.run(payload.batch_size).await?;
        let value = serde_json::to_value(report).map_err(AppError::from)?;
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use lexalert_database::memory::{MemoryAlertStore, MemoryJobStore};
    use lexalert_entity::alert::{AlertCategory, AlertPriority, AlertTransition, CreateAlert};

    use crate::queue::JobQueue;
    use crate::retry::RetryPolicy;

    fn setup() -> (Arc<MemoryAlertStore>, Arc<MemoryJobStore>, Reconciler) {
        let (alerts, jobs, _, reconciler) = setup_with_queue();
        (alerts, jobs, reconciler)
    }

    fn setup_with_queue() -> (
        Arc<MemoryAlertStore>,
        Arc<MemoryJobStore>,
        Arc<JobQueue>,
        Reconciler,
    ) {
        let alerts = Arc::new(MemoryAlertStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let queue = Arc::new(JobQueue::new(
            jobs.clone(),
            "reconcile-test",
            std::time::Duration::from_secs(60),
            RetryPolicy::default(),
        ));
        let scheduler =
            ReminderScheduler::new(Arc::clone(&queue), std::time::Duration::from_secs(3600));
        let reconciler = Reconciler::new(alerts.clone(), scheduler, 2);
        (alerts, jobs, queue, reconciler)
    }

    fn input(owner_id: Uuid, due_in_days: Option<i64>) -> CreateAlert {
        CreateAlert {
            owner_id,
            title: "Renew licence".into(),
            description: "Annual bar licence renewal".into(),
            category: AlertCategory::Compliance,
            priority: AlertPriority::Medium,
            due_date: due_in_days.map(|d| Utc::now() + Duration::days(d)),
            metadata: serde_json::json!({}),
        }
    }

    #[tokio::test]
    async fn test_schedules_alerts_missing_a_job_across_pages() {
        let (alerts, jobs, reconciler) = setup();
        let owner = Uuid::new_v4();
        for days in 1..=5 {
            alerts.create(&input(owner, Some(days))).await.unwrap();
        }
        alerts.create(&input(owner, None)).await.unwrap();

        let report = reconciler.run(None).await.unwrap();
        assert_eq!(report.examined, 5);
        assert_eq!(report.scheduled, 5);

        let pending = jobs
            .all()
            .await
            .into_iter()
            .filter(|j| j.status == JobStatus::Pending)
            .count();
        assert_eq!(pending, 5);
    }

    #[tokio::test]
    async fn test_second_sweep_schedules_nothing() {
        let (alerts, jobs, reconciler) = setup();
        let owner = Uuid::new_v4();
        alerts.create(&input(owner, Some(2))).await.unwrap();

        reconciler.run(None).await.unwrap();
        let report = reconciler.run(None).await.unwrap();

        assert_eq!(report.scheduled, 0);
        assert_eq!(jobs.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_alerts_are_ignored() {
        let (alerts, _, reconciler) = setup();
        let owner = Uuid::new_v4();
        let alert = alerts.create(&input(owner, Some(2))).await.unwrap();
        alerts
            .transition_status(alert.id, Some(owner), AlertTransition::Dismiss, Some(owner))
            .await
            .unwrap();

        let report = reconciler.run(Some(10)).await.unwrap();
        assert_eq!(report, ReconcileReport::default());
    }

    #[tokio::test]
    async fn test_dead_lettered_reminder_is_not_revived() {
        let (alerts, jobs, queue, reconciler) = setup_with_queue();
        let alert = alerts.create(&input(Uuid::new_v4(), Some(2))).await.unwrap();

        let report = reconciler.run(None).await.unwrap();
        assert_eq!(report.scheduled, 1);

        let names = vec![lexalert_entity::job::queues::REMINDERS.to_string()];
        let claimed = queue
            .dequeue_at(&names, Utc::now() + Duration::days(3))
            .await
            .unwrap()
            .unwrap();
        queue.dead_letter(&claimed, "Owner not found").await.unwrap();

        for _ in 0..3 {
            let report = reconciler.run(None).await.unwrap();
            assert_eq!(report.scheduled, 0);
            assert_eq!(report.dead_lettered, 1);
        }
        let all = jobs.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, JobStatus::Dead);

        // An operator retry makes the job active again; still nothing new.
        queue.revive(claimed.id).await.unwrap();
        let report = reconciler.run(None).await.unwrap();
        assert_eq!(report, ReconcileReport { examined: 1, ..ReconcileReport::default() });
        assert_eq!(alerts.find_by_id(alert.id).await.unwrap().unwrap().reminder_sent_at, None);
    }
}
