//! Store traits the service and worker layers are written against.
//!
//! Every method that changes state under contention is conditional: it
//! only applies when the row is still in the expected state and reports
//! whether it did. Losing a race is never an error.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use lexalert_core::result::AppResult;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_entity::alert::{Alert, AlertFilter, AlertTransition, CreateAlert, UpdateAlert};
use lexalert_entity::job::{CreateJob, Job, JobStats, JobStatus};
use lexalert_entity::user::UserContact;

/// Persisted alerts. Soft-deleted alerts are invisible to every method.
#[async_trait]
pub trait AlertStore: Send + Sync + std::fmt::Debug + 'static {
    /// Persist a new alert in `PENDING`.
    async fn create(&self, data: &CreateAlert) -> AppResult<Alert>;

    /// Find an alert regardless of owner.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Alert>>;

    /// Find an alert only if `owner_id` owns it.
    async fn find_for_owner(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Alert>>;

    /// List an owner's alerts by due date ascending (no due date last),
    /// then creation time.
    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        filter: &AlertFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Alert>>;

    /// Apply a partial update. A due date change clears the reminder record.
    async fn update_details(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateAlert,
    ) -> AppResult<Option<Alert>>;

    /// Move the alert through `transition` if its status is still eligible.
    ///
    /// `owner_id` scopes the update when set. Returns `None` when the alert
    /// is missing or no longer eligible.
    async fn transition_status(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
        transition: AlertTransition,
        actor: Option<Uuid>,
    ) -> AppResult<Option<Alert>>;

    /// Record that `job_id` delivered the reminder at `sent_at`.
    async fn record_reminder_sent(
        &self,
        id: Uuid,
        job_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Soft-delete an owned alert, returning it as it was.
    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Alert>>;

    /// Open alerts with a due date and no recorded reminder, ordered by id,
    /// starting after `after`.
    async fn find_awaiting_reminder(
        &self,
        after: Option<Uuid>,
        limit: u32,
    ) -> AppResult<Vec<Alert>>;
}

/// Read-only user lookup for notification delivery.
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug + 'static {
    /// Resolve a user's contact details. Soft-deleted users are missing.
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<UserContact>>;
}

/// Durable job queue storage.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a pending job, cancelling any other pending job with the
    /// same dedup key in the same step.
    async fn insert(&self, data: &CreateJob) -> AppResult<Job>;

    /// Lease one claimable job from `queues` to `worker_id` until
    /// `now + lease`, incrementing its attempt count.
    async fn claim_next(
        &self,
        queues: &[String],
        worker_id: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Job>>;

    /// Mark a leased job completed.
    ///
    /// The settling calls below apply only while `worker_id` still holds the
    /// lease taken on claim number `attempt`.
    async fn complete(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        result: Option<&serde_json::Value>,
    ) -> AppResult<bool>;

    /// Return a leased job to pending, deliverable at `run_at`.
    async fn reschedule(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        run_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<bool>;

    /// Move a leased job to the dead-letter state.
    async fn dead_letter(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        error: &str,
    ) -> AppResult<bool>;

    /// Cancel a pending job.
    async fn cancel(&self, job_id: Uuid) -> AppResult<bool>;

    /// Cancel the pending job holding `dedup_key`, if any.
    async fn cancel_by_key(&self, dedup_key: &str) -> AppResult<u64>;

    /// Find a job by ID.
    async fn find_by_id(&self, job_id: Uuid) -> AppResult<Option<Job>>;

    /// Find the pending or running job holding `dedup_key`.
    async fn find_active_by_key(&self, dedup_key: &str) -> AppResult<Option<Job>>;

    /// Find the most recently created job under `dedup_key`, in any status.
    async fn find_latest_by_key(&self, dedup_key: &str) -> AppResult<Option<Job>>;

    /// List jobs, newest first.
    async fn list(
        &self,
        status: Option<JobStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>>;

    /// Count jobs per status.
    async fn count_by_status(&self) -> AppResult<JobStats>;

    /// Return a dead job to pending with its attempts reset.
    async fn revive(&self, job_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Job>>;

    /// Delete completed and cancelled jobs last updated before `before`.
    async fn purge_finished(&self, before: DateTime<Utc>) -> AppResult<u64>;
}
