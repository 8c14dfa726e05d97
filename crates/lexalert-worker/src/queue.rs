//! Job queue over a [`JobStore`]: enqueue, lease, settle, and admin operations.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use lexalert_core::error::AppError;
use lexalert_core::result::AppResult;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_database::JobStore;
use lexalert_entity::job::{CreateJob, Job, JobStats, JobStatus};

use crate::retry::RetryPolicy;

/// Parameters for enqueuing a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreateParams {
    /// Type of job (e.g., `"alert_reminder"`).
    pub job_type: String,
    /// Queue name (e.g., `"reminders"`, `"maintenance"`).
    pub queue: String,
    /// Job payload as JSON.
    pub payload: serde_json::Value,
    /// Replaces any pending job with the same key.
    pub dedup_key: Option<String>,
    /// Overrides the policy's attempt limit.
    pub max_attempts: Option<i32>,
    /// Earliest delivery time; `None` means now.
    pub deliver_at: Option<DateTime<Utc>>,
}

impl JobCreateParams {
    /// Parameters for an immediate job with policy defaults.
    pub fn new(
        job_type: impl Into<String>,
        queue: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            job_type: job_type.into(),
            queue: queue.into(),
            payload,
            dedup_key: None,
            max_attempts: None,
            deliver_at: None,
        }
    }
}

/// What happened to a job after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RetryOutcome {
    /// Back to pending, deliverable at `run_at`.
    Rescheduled {
        /// Next delivery time.
        run_at: DateTime<Utc>,
    },
    /// Attempts exhausted; moved to the dead-letter state.
    DeadLettered,
    /// The lease was lost before the failure was recorded.
    LeaseLost,
}

/// Queue statistics for one worker's view of the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    /// Job counts per status.
    #[serde(flatten)]
    pub counts: JobStats,
    /// Current worker identifier.
    pub worker_id: String,
}

/// Job queue for enqueuing and leasing work.
#[derive(Debug, Clone)]
pub struct JobQueue {
    store: Arc<dyn JobStore>,
    worker_id: String,
    lease: Duration,
    policy: RetryPolicy,
}

impl JobQueue {
    /// Create a job queue acting as `worker_id`.
    pub fn new(
        store: Arc<dyn JobStore>,
        worker_id: impl Into<String>,
        lease: std::time::Duration,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            worker_id: worker_id.into(),
            lease: Duration::from_std(lease).unwrap_or_else(|_| Duration::minutes(2)),
            policy,
        }
    }

    /// The identifier this queue claims jobs under.
    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    /// The retry policy applied to failures.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Enqueue a new job.
    pub async fn enqueue(&self, params: JobCreateParams) -> AppResult<Job> {
        let mut data = CreateJob::new(
            params.job_type,
            params.queue,
            params.payload,
            params.max_attempts.unwrap_or(self.policy.max_attempts),
        );
        if let Some(key) = params.dedup_key {
            data = data.with_dedup_key(key);
        }
        if let Some(at) = params.deliver_at {
            data = data.deliver_at(at);
        }

        let job = self.store.insert(&data).await?;
        debug!(
            job_id = %job.id,
            job_type = %job.job_type,
            queue = %job.queue,
            scheduled_at = %job.scheduled_at,
            "Enqueued job"
        );
        Ok(job)
    }

    /// Lease the next deliverable job from `queues`.
    pub async fn dequeue(&self, queues: &[String]) -> AppResult<Option<Job>> {
        self.dequeue_at(queues, Utc::now()).await
    }

    /// Lease the next job deliverable at `now`.
    pub async fn dequeue_at(
        &self,
        queues: &[String],
        now: DateTime<Utc>,
    ) -> AppResult<Option<Job>> {
        let job = self
            .store
            .claim_next(queues, &self.worker_id, self.lease, now)
            .await?;
        if let Some(job) = &job {
            debug!(
                job_id = %job.id,
                job_type = %job.job_type,
                attempt = job.attempts,
                "Dequeued job"
            );
        }
        Ok(job)
    }

    /// Mark a leased job completed. Returns `false` if the lease was lost.
    pub async fn complete(
        &self,
        job: &Job,
        result: Option<serde_json::Value>,
    ) -> AppResult<bool> {
        let done = self
            .store
            .complete(job.id, &self.worker_id, job.attempts, result.as_ref())
            .await?;
        if !done {
            warn!(job_id = %job.id, "Lease lost before completion");
        }
        Ok(done)
    }

    /// Record a transient failure: reschedule with backoff, or dead-letter
    /// once the attempt limit is reached.
    pub async fn retry_later(&self, job: &Job, error: &str) -> AppResult<RetryOutcome> {
        if !job.has_attempts_left() {
            return self.dead_letter(job, error).await;
        }

        let run_at = Utc::now() + self.policy.delay_for(job.attempts);
        let done = self
            .store
            .reschedule(job.id, &self.worker_id, job.attempts, run_at, error)
            .await?;
        if !done {
            warn!(job_id = %job.id, "Lease lost before retry was recorded");
            return Ok(RetryOutcome::LeaseLost);
        }

        info!(
            job_id = %job.id,
            attempt = job.attempts,
            max_attempts = job.max_attempts,
            %run_at,
            "Job rescheduled"
        );
        Ok(RetryOutcome::Rescheduled { run_at })
    }

    /// Move a leased job to the dead-letter state.
    pub async fn dead_letter(&self, job: &Job, error: &str) -> AppResult<RetryOutcome> {
        let done = self
            .store
            .dead_letter(job.id, &self.worker_id, job.attempts, error)
            .await?;
        if !done {
            warn!(job_id = %job.id, "Lease lost before dead-lettering");
            return Ok(RetryOutcome::LeaseLost);
        }
        warn!(
            job_id = %job.id,
            job_type = %job.job_type,
            attempts = job.attempts,
            error,
            "Job dead-lettered"
        );
        Ok(RetryOutcome::DeadLettered)
    }

    /// Cancel a pending job.
    pub async fn cancel(&self, job_id: Uuid) -> AppResult<Job> {
        if !self.store.cancel(job_id).await? {
            return match self.store.find_by_id(job_id).await? {
                Some(job) => Err(AppError::conflict(format!(
                    "Job {job_id} is {} and cannot be cancelled",
                    job.status
                ))),
                None => Err(AppError::not_found(format!("Job {job_id} not found"))),
            };
        }
        info!(%job_id, "Job cancelled");
        self.find(job_id).await
    }

    /// Cancel the pending job holding `dedup_key`. No-op when none exists.
    pub async fn cancel_by_key(&self, dedup_key: &str) -> AppResult<u64> {
        let cancelled = self.store.cancel_by_key(dedup_key).await?;
        if cancelled > 0 {
            debug!(dedup_key, "Cancelled pending job");
        }
        Ok(cancelled)
    }

    /// Return a dead job to pending with a fresh attempt budget.
    pub async fn revive(&self, job_id: Uuid) -> AppResult<Job> {
        match self.store.revive(job_id, Utc::now()).await? {
            Some(job) => {
                info!(%job_id, "Dead job revived");
                Ok(job)
            }
            None => match self.store.find_by_id(job_id).await? {
                Some(job) => Err(AppError::conflict(format!(
                    "Job {job_id} is {}; only dead jobs can be retried",
                    job.status
                ))),
                None => Err(AppError::not_found(format!("Job {job_id} not found"))),
            },
        }
    }

    /// Find a job by ID.
    pub async fn find(&self, job_id: Uuid) -> AppResult<Job> {
        self.store
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Job {job_id} not found")))
    }

    /// Find the newest job ever enqueued under `dedup_key`.
    pub async fn find_latest_by_key(&self, dedup_key: &str) -> AppResult<Option<Job>> {
        self.store.find_latest_by_key(dedup_key).await
    }

    /// List jobs, newest first.
    pub async fn list(
        &self,
        status: Option<JobStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>> {
        self.store.list(status, page).await
    }

    /// Get queue statistics.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        Ok(QueueStats {
            counts: self.store.count_by_status().await?,
            worker_id: self.worker_id.clone(),
        })
    }

    /// Delete completed and cancelled jobs older than `retention`.
    pub async fn purge_finished(&self, retention: Duration) -> AppResult<u64> {
        let before = Utc::now().checked_sub_signed(retention).ok_or_else(|| {
            AppError::configuration(format!(
                "Retention window of {} days is out of range",
                retention.num_days()
            ))
        })?;
        self.store.purge_finished(before).await
    }
}
