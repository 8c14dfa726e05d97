//! Job queue inspection and repair for administrators.
//!
//! Callers are expected to have checked admin rights already (the HTTP
//! admin guard, or shell access for the CLI).

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use lexalert_core::error::AppError;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_entity::job::{Job, JobStatus};
use lexalert_worker::jobs::{ReconcileReport, Reconciler};
use lexalert_worker::{JobQueue, QueueStats};

/// Admin view over the job queue and the reminder reconciler.
#[derive(Debug, Clone)]
pub struct JobAdminService {
    /// Job queue.
    queue: Arc<JobQueue>,
    /// Reminder reconciler.
    reconciler: Arc<Reconciler>,
}

impl JobAdminService {
    /// Creates a new job admin service.
    pub fn new(queue: Arc<JobQueue>, reconciler: Arc<Reconciler>) -> Self {
        Self { queue, reconciler }
    }

    /// Lists jobs, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<JobStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<Job>, AppError> {
        self.queue.list(status, page).await
    }

    /// Job counts per status.
    pub async fn stats(&self) -> Result<QueueStats, AppError> {
        self.queue.stats().await
    }

    /// Gets a job by ID.
    pub async fn get(&self, job_id: Uuid) -> Result<Job, AppError> {
        self.queue.find(job_id).await
    }

    /// Re-queues a dead-lettered job with a fresh attempt budget.
    pub async fn retry(&self, job_id: Uuid) -> Result<Job, AppError> {
        let job = self.queue.revive(job_id).await?;
        info!(job_id = %job_id, "Dead job re-queued by admin");
        Ok(job)
    }

    /// Cancels a pending job.
    pub async fn cancel(&self, job_id: Uuid) -> Result<Job, AppError> {
        let job = self.queue.cancel(job_id).await?;
        info!(job_id = %job_id, "Job cancelled by admin");
        Ok(job)
    }

    /// Runs a reminder reconciliation sweep inline.
    pub async fn reconcile(&self) -> Result<ReconcileReport, AppError> {
        self.reconciler.run(None).await
    }
}
