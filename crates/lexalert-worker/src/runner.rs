//! Worker runner: the loop that leases jobs and settles their outcome.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, watch};
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use lexalert_core::config::WorkerConfig;
use lexalert_core::result::AppResult;
use lexalert_entity::job::{Job, queues};

use crate::executor::JobExecutor;
use crate::queue::{JobQueue, RetryOutcome};

/// How a single delivery of a job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Handler succeeded and the job completed.
    Completed,
    /// Transient failure; the job runs again at `run_at`.
    Rescheduled {
        /// Next delivery time.
        run_at: DateTime<Utc>,
    },
    /// Permanent failure or attempts exhausted.
    DeadLettered,
    /// Another worker took over the job before it was settled.
    LeaseLost,
}

impl From<RetryOutcome> for JobOutcome {
    fn from(outcome: RetryOutcome) -> Self {
        match outcome {
            RetryOutcome::Rescheduled { run_at } => Self::Rescheduled { run_at },
            RetryOutcome::DeadLettered => Self::DeadLettered,
            RetryOutcome::LeaseLost => Self::LeaseLost,
        }
    }
}

/// Run one leased job through its handler and record the outcome.
pub async fn process_job(
    queue: &JobQueue,
    executor: &JobExecutor,
    job: &Job,
) -> AppResult<JobOutcome> {
    if job.attempts_exhausted() {
        // The previous holder's lease ran out on its final attempt.
        let message = format!(
            "Attempt {} exceeds limit of {}",
            job.attempts, job.max_attempts
        );
        return queue.dead_letter(job, &message).await.map(Into::into);
    }

    info!(
        job_id = %job.id,
        job_type = %job.job_type,
        attempt = job.attempts,
        max_attempts = job.max_attempts,
        "Processing job"
    );

    match executor.execute(job).await {
        Ok(result) => {
            if queue.complete(job, result).await? {
                info!(job_id = %job.id, "Job completed");
                Ok(JobOutcome::Completed)
            } else {
                Ok(JobOutcome::LeaseLost)
            }
        }
        Err(err) if err.is_retryable() => {
            warn!(job_id = %job.id, error = %err, "Job failed (transient)");
            queue.retry_later(job, &err.to_string()).await.map(Into::into)
        }
        Err(err) => {
            error!(job_id = %job.id, error = %err, "Job failed permanently");
            queue.dead_letter(job, &err.to_string()).await.map(Into::into)
        }
    }
}

/// Main worker runner that polls queues and executes jobs.
#[derive(Debug)]
pub struct WorkerRunner {
    queue: Arc<JobQueue>,
    executor: Arc<JobExecutor>,
    config: WorkerConfig,
    queues: Vec<String>,
}

impl WorkerRunner {
    /// Create a runner polling every known queue.
    pub fn new(queue: Arc<JobQueue>, executor: Arc<JobExecutor>, config: WorkerConfig) -> Self {
        Self {
            queue,
            executor,
            config,
            queues: queues::ALL.iter().map(|q| q.to_string()).collect(),
        }
    }

    /// Run until the shutdown signal flips to `true`, then wait (bounded)
    /// for in-flight jobs.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let worker_id = self.queue.worker_id().to_string();
        let concurrency = self.config.concurrency.max(1);
        info!(
            worker_id = %worker_id,
            concurrency,
            poll_interval_seconds = self.config.poll_interval_seconds,
            queues = ?self.queues,
            "Worker started"
        );

        let semaphore = Arc::new(Semaphore::new(concurrency));
        let poll_interval = self.config.poll_interval();

        loop {
            if *shutdown.borrow() {
                break;
            }

            let dispatched = self.poll_and_execute(&semaphore, &mut shutdown).await;
            if *shutdown.borrow() {
                break;
            }
            if dispatched {
                continue;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = time::sleep(poll_interval) => {}
            }
        }

        info!(worker_id = %worker_id, "Worker draining in-flight jobs");
        let grace = Duration::from_secs(self.config.shutdown_grace_seconds);
        let all_permits = concurrency as u32;
        if time::timeout(grace, semaphore.acquire_many(all_permits)).await.is_err() {
            warn!(worker_id = %worker_id, "Shutdown grace elapsed with jobs still running");
        }
        info!(worker_id = %worker_id, "Worker stopped");
    }

    /// Lease one job and spawn its processing. Returns whether a job was
    /// dispatched.
    ///
    /// Waiting for a free slot gives way to shutdown.
    async fn poll_and_execute(
        &self,
        semaphore: &Arc<Semaphore>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> bool {
        let permit = tokio::select! {
            permit = Arc::clone(semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return false,
            },
            _ = shutdown.wait_for(|stop| *stop) => return false,
        };

        match self.queue.dequeue(&self.queues).await {
            Ok(Some(job)) => {
                let queue = Arc::clone(&self.queue);
                let executor = Arc::clone(&self.executor);
                tokio::spawn(async move {
                    let _permit = permit;
                    if let Err(e) = process_job(&queue, &executor, &job).await {
                        error!(job_id = %job.id, error = %e, "Failed to record job outcome");
                    }
                });
                true
            }
            Ok(None) => {
                debug!("No jobs available");
                false
            }
            Err(e) => {
                error!(error = %e, "Failed to dequeue job");
                false
            }
        }
    }

    /// Process every job deliverable at `now`, one at a time, and return
    /// what happened to each.
    pub async fn drain(&self, now: DateTime<Utc>) -> AppResult<Vec<(Uuid, JobOutcome)>> {
        let mut outcomes = Vec::new();
        while let Some(job) = self.queue.dequeue_at(&self.queues, now).await? {
            let outcome = process_job(&self.queue, &self.executor, &job).await?;
            outcomes.push((job.id, outcome));
        }
        Ok(outcomes)
    }
}
