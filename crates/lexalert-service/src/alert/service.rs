//! Owner-scoped alert CRUD and status transitions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use lexalert_core::error::AppError;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_database::AlertStore;
use lexalert_entity::alert::{
    Alert, AlertCategory, AlertFilter, AlertPriority, AlertTransition, CreateAlert, UpdateAlert,
};
use lexalert_worker::ReminderScheduler;

use crate::context::RequestContext;

/// Longest accepted title, in characters, after trimming.
pub const MAX_TITLE_LEN: usize = 255;

/// Request to create a new alert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAlertRequest {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Category (default `GENERAL`).
    pub category: Option<AlertCategory>,
    /// Priority (default `MEDIUM`).
    pub priority: Option<AlertPriority>,
    /// Optional due date.
    pub due_date: Option<chrono::DateTime<chrono::Utc>>,
    /// Client metadata; must be a JSON object when present.
    pub metadata: Option<serde_json::Value>,
}

fn normalize_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("Title is required"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::validation(format!(
            "Title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title.to_string())
}

fn normalize_description(description: &str) -> Result<String, AppError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(AppError::validation("Description is required"));
    }
    Ok(description.to_string())
}

fn check_metadata(metadata: &serde_json::Value) -> Result<(), AppError> {
    if metadata.is_object() {
        Ok(())
    } else {
        Err(AppError::validation("Metadata must be a JSON object"))
    }
}

/// Manages alerts and keeps their reminder jobs in step.
#[derive(Debug, Clone)]
pub struct AlertService {
    /// Alert store.
    alerts: Arc<dyn AlertStore>,
    /// Reminder scheduler.
    reminders: ReminderScheduler,
}

impl AlertService {
    /// Creates a new alert service.
    pub fn new(alerts: Arc<dyn AlertStore>, reminders: ReminderScheduler) -> Self {
        Self { alerts, reminders }
    }

    /// Creates an alert and schedules its reminder.
    ///
    /// Scheduling is best-effort: a failure is logged and left to the
    /// reconciler, and the alert is still returned.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateAlertRequest,
    ) -> Result<Alert, AppError> {
        let metadata = req.metadata.unwrap_or_else(|| serde_json::json!({}));
        check_metadata(&metadata)?;

        let data = CreateAlert {
            owner_id: ctx.user_id,
            title: normalize_title(&req.title)?,
            description: normalize_description(&req.description)?,
            category: req.category.unwrap_or_default(),
            priority: req.priority.unwrap_or_default(),
            due_date: req.due_date,
            metadata,
        };

        let alert = self.alerts.create(&data).await?;
        info!(alert_id = %alert.id, owner_id = %ctx.user_id, "Alert created");

        self.schedule_best_effort(&alert).await;
        Ok(alert)
    }

    /// Lists the caller's alerts.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        filter: &AlertFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<Alert>, AppError> {
        self.alerts.list_for_owner(ctx.user_id, filter, page).await
    }

    /// Gets one of the caller's alerts.
    pub async fn get(&self, ctx: &RequestContext, alert_id: Uuid) -> Result<Alert, AppError> {
        self.alerts
            .find_for_owner(alert_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Alert not found"))
    }

    /// Applies a partial update. Moving the due date re-schedules the
    /// reminder; clearing it cancels the reminder.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        alert_id: Uuid,
        mut patch: UpdateAlert,
    ) -> Result<Alert, AppError> {
        if let Some(title) = &patch.title {
            patch.title = Some(normalize_title(title)?);
        }
        if let Some(description) = &patch.description {
            patch.description = Some(normalize_description(description)?);
        }
        if let Some(metadata) = &patch.metadata {
            check_metadata(metadata)?;
        }

        let current = self.get(ctx, alert_id).await?;
        if patch.is_empty() {
            return Ok(current);
        }
        let due_changed = patch.changes_due_date(current.due_date);

        let updated = self
            .alerts
            .update_details(alert_id, ctx.user_id, &patch)
            .await?
            .ok_or_else(|| AppError::not_found("Alert not found"))?;
        info!(alert_id = %alert_id, due_changed, "Alert updated");

        if due_changed {
            if updated.in_reminder_pipeline() {
                self.schedule_best_effort(&updated).await;
            } else {
                self.cancel_best_effort(alert_id).await;
            }
        }
        Ok(updated)
    }

    /// Acknowledges a pending alert.
    pub async fn acknowledge(
        &self,
        ctx: &RequestContext,
        alert_id: Uuid,
    ) -> Result<Alert, AppError> {
        self.transition(ctx, alert_id, AlertTransition::Acknowledge)
            .await
    }

    /// Resolves an open alert and cancels its reminder.
    pub async fn resolve(&self, ctx: &RequestContext, alert_id: Uuid) -> Result<Alert, AppError> {
        self.transition(ctx, alert_id, AlertTransition::Resolve)
            .await
    }

    /// Dismisses an open alert and cancels its reminder.
    pub async fn dismiss(&self, ctx: &RequestContext, alert_id: Uuid) -> Result<Alert, AppError> {
        self.transition(ctx, alert_id, AlertTransition::Dismiss)
            .await
    }

    /// Soft-deletes an alert and cancels its reminder.
    pub async fn delete(&self, ctx: &RequestContext, alert_id: Uuid) -> Result<(), AppError> {
        self.alerts
            .soft_delete(alert_id, ctx.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Alert not found"))?;
        info!(alert_id = %alert_id, owner_id = %ctx.user_id, "Alert deleted");

        self.cancel_best_effort(alert_id).await;
        Ok(())
    }

    /// Applies a conditional transition. An ineligible alert (already moved
    /// on, possibly by the worker) is returned unchanged.
    async fn transition(
        &self,
        ctx: &RequestContext,
        alert_id: Uuid,
        transition: AlertTransition,
    ) -> Result<Alert, AppError> {
        let applied = self
            .alerts
            .transition_status(alert_id, Some(ctx.user_id), transition, Some(ctx.user_id))
            .await?;

        match applied {
            Some(alert) => {
                info!(
                    alert_id = %alert_id,
                    transition = %transition,
                    status = %alert.status,
                    "Alert transitioned"
                );
                if transition.closes() {
                    self.cancel_best_effort(alert_id).await;
                }
                Ok(alert)
            }
            None => self.get(ctx, alert_id).await,
        }
    }

    async fn schedule_best_effort(&self, alert: &Alert) {
        if let Err(e) = self.reminders.schedule(alert).await {
            warn!(alert_id = %alert.id, error = %e, "Failed to schedule reminder");
        }
    }

    async fn cancel_best_effort(&self, alert_id: Uuid) {
        if let Err(e) = self.reminders.cancel(alert_id).await {
            warn!(alert_id = %alert_id, error = %e, "Failed to cancel reminder");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use lexalert_core::error::ErrorKind;
    use lexalert_database::memory::{MemoryAlertStore, MemoryJobStore};
    use lexalert_entity::alert::AlertStatus;
    use lexalert_entity::job::JobStatus;
    use lexalert_entity::user::UserRole;
    use lexalert_worker::{JobQueue, RetryPolicy};

    struct Fixture {
        jobs: Arc<MemoryJobStore>,
        service: AlertService,
        ctx: RequestContext,
    }

    fn fixture() -> Fixture {
        let alerts = Arc::new(MemoryAlertStore::new());
        let jobs = Arc::new(MemoryJobStore::new());
        let queue = Arc::new(JobQueue::new(
            jobs.clone(),
            "service-test",
            std::time::Duration::from_secs(60),
            RetryPolicy::default(),
        ));
        let reminders = ReminderScheduler::new(queue, std::time::Duration::from_secs(24 * 3600));
        Fixture {
            jobs,
            service: AlertService::new(alerts, reminders),
            ctx: RequestContext::new(Uuid::new_v4(), UserRole::Lawyer),
        }
    }

    impl Fixture {
        async fn pending_jobs(&self) -> Vec<lexalert_entity::job::Job> {
            self.jobs
                .all()
                .await
                .into_iter()
                .filter(|j| j.status == JobStatus::Pending)
                .collect()
        }
    }

    fn request(title: &str, due_in_days: Option<i64>) -> CreateAlertRequest {
        CreateAlertRequest {
            title: title.into(),
            description: "Statutory deadline".into(),
            due_date: due_in_days.map(|d| Utc::now() + Duration::days(d)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_schedules() {
        let fx = fixture();
        let alert = fx
            .service
            .create(&fx.ctx, request("  File appeal  ", Some(7)))
            .await
            .unwrap();

        assert_eq!(alert.title, "File appeal");
        assert_eq!(alert.status, AlertStatus::Pending);
        assert_eq!(alert.category, AlertCategory::General);
        assert_eq!(alert.owner_id, fx.ctx.user_id);
        assert_eq!(fx.pending_jobs().await.len(), 1);
    }

    #[tokio::test]
    async fn test_create_without_due_date_schedules_nothing() {
        let fx = fixture();
        fx.service.create(&fx.ctx, request("Note", None)).await.unwrap();
        assert!(fx.jobs.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let fx = fixture();
        let blank = fx.service.create(&fx.ctx, request("   ", None)).await.unwrap_err();
        assert_eq!(blank.kind, ErrorKind::Validation);

        let long = "x".repeat(MAX_TITLE_LEN + 1);
        let too_long = fx.service.create(&fx.ctx, request(&long, None)).await.unwrap_err();
        assert_eq!(too_long.kind, ErrorKind::Validation);

        let mut no_description = request("Title", None);
        no_description.description = " ".into();
        let err = fx.service.create(&fx.ctx, no_description).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let mut bad_metadata = request("Title", None);
        bad_metadata.metadata = Some(serde_json::json!([1, 2]));
        let err = fx.service.create(&fx.ctx, bad_metadata).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        assert!(fx.jobs.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_other_owner_sees_not_found() {
        let fx = fixture();
        let alert = fx.service.create(&fx.ctx, request("Mine", None)).await.unwrap();
        let stranger = RequestContext::new(Uuid::new_v4(), UserRole::Lawyer);

        let err = fx.service.get(&stranger, alert.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = fx.service.resolve(&stranger, alert.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        let err = fx.service.delete(&stranger, alert.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_due_date_change_replaces_reminder() {
        let fx = fixture();
        let alert = fx.service.create(&fx.ctx, request("Move me", Some(5))).await.unwrap();
        let first = fx.pending_jobs().await;

        let new_due = Utc::now() + Duration::days(20);
        let patch = UpdateAlert {
            due_date: Some(Some(new_due)),
            ..Default::default()
        };
        let updated = fx.service.update(&fx.ctx, alert.id, patch).await.unwrap();
        assert_eq!(updated.due_date, Some(new_due));

        let pending = fx.pending_jobs().await;
        assert_eq!(pending.len(), 1);
        assert_ne!(pending[0].id, first[0].id);
        assert_eq!(pending[0].scheduled_at, new_due - Duration::days(1));
    }

    #[tokio::test]
    async fn test_clearing_due_date_cancels_reminder() {
        let fx = fixture();
        let alert = fx.service.create(&fx.ctx, request("Clear me", Some(5))).await.unwrap();

        let patch = UpdateAlert {
            due_date: Some(None),
            ..Default::default()
        };
        fx.service.update(&fx.ctx, alert.id, patch).await.unwrap();
        assert!(fx.pending_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn test_title_only_update_keeps_reminder() {
        let fx = fixture();
        let alert = fx.service.create(&fx.ctx, request("Old", Some(5))).await.unwrap();
        let before = fx.pending_jobs().await;

        let patch = UpdateAlert {
            title: Some(" New ".into()),
            ..Default::default()
        };
        let updated = fx.service.update(&fx.ctx, alert.id, patch).await.unwrap();
        assert_eq!(updated.title, "New");
        assert_eq!(fx.pending_jobs().await[0].id, before[0].id);
    }

    #[tokio::test]
    async fn test_resolve_cancels_reminder_and_is_idempotent() {
        let fx = fixture();
        let alert = fx.service.create(&fx.ctx, request("Close", Some(5))).await.unwrap();

        let resolved = fx.service.resolve(&fx.ctx, alert.id).await.unwrap();
        assert_eq!(resolved.status, AlertStatus::Resolved);
        assert_eq!(resolved.resolved_by, Some(fx.ctx.user_id));
        assert!(fx.pending_jobs().await.is_empty());

        let again = fx.service.dismiss(&fx.ctx, alert.id).await.unwrap();
        assert_eq!(again.status, AlertStatus::Resolved);
    }

    #[tokio::test]
    async fn test_acknowledge_keeps_reminder() {
        let fx = fixture();
        let alert = fx.service.create(&fx.ctx, request("Ack", Some(5))).await.unwrap();

        let acked = fx.service.acknowledge(&fx.ctx, alert.id).await.unwrap();
        assert_eq!(acked.status, AlertStatus::Acknowledged);
        assert_eq!(fx.pending_jobs().await.len(), 1);

        let again = fx.service.acknowledge(&fx.ctx, alert.id).await.unwrap();
        assert_eq!(again.status, AlertStatus::Acknowledged);
    }

    #[tokio::test]
    async fn test_delete_cancels_reminder() {
        let fx = fixture();
        let alert = fx.service.create(&fx.ctx, request("Drop", Some(5))).await.unwrap();

        fx.service.delete(&fx.ctx, alert.id).await.unwrap();
        assert!(fx.pending_jobs().await.is_empty());
        let err = fx.service.get(&fx.ctx, alert.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped_and_filtered() {
        let fx = fixture();
        fx.service.create(&fx.ctx, request("A", Some(3))).await.unwrap();
        let b = fx.service.create(&fx.ctx, request("B", Some(1))).await.unwrap();
        fx.service.resolve(&fx.ctx, b.id).await.unwrap();
        let stranger = RequestContext::new(Uuid::new_v4(), UserRole::Client);
        fx.service.create(&stranger, request("C", Some(2))).await.unwrap();

        let all = fx
            .service
            .list(&fx.ctx, &AlertFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        let titles: Vec<&str> = all.items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A"]);

        let filter = AlertFilter {
            status: Some(AlertStatus::Pending),
            ..Default::default()
        };
        let open = fx.service.list(&fx.ctx, &filter, &PageRequest::default()).await.unwrap();
        assert_eq!(open.items.len(), 1);
        assert_eq!(open.items[0].title, "A");
    }
}
