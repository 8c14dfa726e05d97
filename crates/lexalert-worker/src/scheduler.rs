//! Cron scheduler for periodic maintenance tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use lexalert_core::config::ReminderConfig;
use lexalert_core::error::AppError;
use lexalert_entity::job::{job_types, queues};

use crate::queue::{JobCreateParams, JobQueue};

/// Cron-based scheduler for periodic background tasks.
///
/// Each tick only enqueues a job onto the maintenance queue; the work itself
/// runs in whichever worker leases it.
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Job queue for enqueuing scheduled work
    queue: Arc<JobQueue>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(queue: Arc<JobQueue>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, queue })
    }

    /// Register the reconcile and cleanup schedules
    pub async fn register_default_tasks(&self, config: &ReminderConfig) -> Result<(), AppError> {
        self.register(job_types::REMINDER_RECONCILE, &config.reconcile_cron)
            .await?;
        self.register(job_types::JOB_CLEANUP, &config.cleanup_cron)
            .await?;

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }

    /// Enqueue a `job_type` job on the maintenance queue on every `cron` tick.
    ///
    /// Ticks share one dedup key per type, so a backlog never holds more
    /// than one pending run.
    async fn register(&self, job_type: &'static str, cron: &str) -> Result<(), AppError> {
        let queue = Arc::clone(&self.queue);
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let queue = Arc::clone(&queue);
            Box::pin(async move {
                tracing::debug!(job_type, "Scheduling periodic job");
                let mut params = JobCreateParams::new(
                    job_type,
                    queues::MAINTENANCE,
                    serde_json::json!({}),
                );
                params.dedup_key = Some(format!("cron:{job_type}"));
                params.max_attempts = Some(1);
                if let Err(e) = queue.enqueue(params).await {
                    tracing::error!(job_type, error = %e, "Failed to enqueue periodic job");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid cron expression for {job_type} '{cron}': {e}"))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add {job_type} schedule: {}", e))
        })?;

        tracing::info!(job_type, cron, "Registered periodic job");
        Ok(())
    }
}
