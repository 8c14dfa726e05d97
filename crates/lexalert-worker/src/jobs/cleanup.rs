//! Purge of old finished jobs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use serde_json::{Value, json};
use tracing::info;

use lexalert_entity::job::{CleanupPayload, Job, job_types};

use crate::executor::{JobExecutionError, JobHandler};
use crate::queue::JobQueue;

/// Handles `job_cleanup` jobs. Dead-lettered jobs are kept.
#[derive(Debug)]
pub struct JobCleanupHandler {
    queue: Arc<JobQueue>,
    retention_days: i64,
}

impl JobCleanupHandler {
    /// Create a handler purging jobs older than `retention_days`.
    pub fn new(queue: Arc<JobQueue>, retention_days: i64) -> Self {
        Self {
            queue,
            retention_days,
        }
    }
}

#[async_trait]
impl JobHandler for JobCleanupHandler {
    fn job_type(&self) -> &str {
        job_types::JOB_CLEANUP
    }

    async fn execute(&self, job: &Job) -> Result<Option<Value>, JobExecutionError> {
        let payload: CleanupPayload = serde_json::from_value(job.payload.clone())
            .map_err(|e| JobExecutionError::Permanent(format!("Invalid cleanup payload: {e}")))?;
        let retention_days = payload
            .retention_days
            .map(i64::from)
            .unwrap_or(self.retention_days);

        let retention = Duration::try_days(retention_days)
            .filter(|d| *d >= Duration::zero())
            .ok_or_else(|| {
                JobExecutionError::Permanent(format!(
                    "Retention of {retention_days} days is out of range"
                ))
            })?;

        let purged = self.queue.purge_finished(retention).await?;
        info!(purged, retention_days, "Finished jobs purged");

        Ok(Some(json!({
            "purged": purged,
            "retention_days": retention_days,
        })))
    }
}
