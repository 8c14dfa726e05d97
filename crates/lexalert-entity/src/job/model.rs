//! Job entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::JobStatus;

/// A background job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier.
    pub id: Uuid,
    /// Job type identifier (e.g., `"alert_reminder"`).
    pub job_type: String,
    /// Queue name.
    pub queue: String,
    /// Replacement key; at most one pending job exists per key.
    pub dedup_key: Option<String>,
    /// Job-specific payload (JSON).
    pub payload: serde_json::Value,
    /// Result data on completion (JSON).
    pub result: Option<serde_json::Value>,
    /// Last error message.
    pub error_message: Option<String>,
    /// Current job status.
    pub status: JobStatus,
    /// Number of times the job has been claimed.
    pub attempts: i32,
    /// Maximum allowed attempts.
    pub max_attempts: i32,
    /// Earliest delivery time.
    pub scheduled_at: DateTime<Utc>,
    /// Lease expiry while running.
    pub locked_until: Option<DateTime<Utc>>,
    /// Worker ID holding (or last holding) the lease.
    pub worker_id: Option<String>,
    /// When the current attempt started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the job reached a terminal state.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Check if a worker may claim the job at `now`.
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            JobStatus::Pending => self.scheduled_at <= now,
            JobStatus::Running => self.lease_expired(now),
            _ => false,
        }
    }

    /// Check if a running job's lease has lapsed.
    pub fn lease_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == JobStatus::Running && self.locked_until.is_none_or(|until| until < now)
    }

    /// Check if `worker_id` holds the lease taken on claim number `attempt`.
    ///
    /// A worker id alone is not enough: one process may claim the same job
    /// again after its own lease lapsed.
    pub fn is_held_by(&self, worker_id: &str, attempt: i32) -> bool {
        self.status == JobStatus::Running
            && self.attempts == attempt
            && self.worker_id.as_deref() == Some(worker_id)
    }

    /// Check if the current attempt went beyond the allowed count.
    pub fn attempts_exhausted(&self) -> bool {
        self.attempts > self.max_attempts
    }

    /// Check if a failure on the current attempt should be retried.
    pub fn has_attempts_left(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

/// Data required to enqueue a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    /// Job type identifier.
    pub job_type: String,
    /// Queue name.
    pub queue: String,
    /// Replacement key.
    pub dedup_key: Option<String>,
    /// Job-specific payload.
    pub payload: serde_json::Value,
    /// Maximum attempts.
    pub max_attempts: i32,
    /// Earliest delivery time.
    pub scheduled_at: DateTime<Utc>,
}

impl CreateJob {
    /// Build a job for immediate delivery.
    pub fn new(
        job_type: impl Into<String>,
        queue: impl Into<String>,
        payload: serde_json::Value,
        max_attempts: i32,
    ) -> Self {
        Self {
            job_type: job_type.into(),
            queue: queue.into(),
            dedup_key: None,
            payload,
            max_attempts,
            scheduled_at: Utc::now(),
        }
    }

    /// Set the replacement key.
    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = Some(key.into());
        self
    }

    /// Delay delivery until `at`.
    pub fn deliver_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = at;
        self
    }

    /// Materialize the job row as the store would insert it.
    pub fn into_job(self, now: DateTime<Utc>) -> Job {
        Job {
            id: Uuid::now_v7(),
            job_type: self.job_type,
            queue: self.queue,
            dedup_key: self.dedup_key,
            payload: self.payload,
            result: None,
            error_message: None,
            status: JobStatus::Pending,
            attempts: 0,
            max_attempts: self.max_attempts,
            scheduled_at: self.scheduled_at,
            locked_until: None,
            worker_id: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Job counts per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStats {
    /// Pending jobs.
    pub pending: u64,
    /// Running jobs.
    pub running: u64,
    /// Completed jobs.
    pub completed: u64,
    /// Dead-lettered jobs.
    pub dead: u64,
    /// Cancelled jobs.
    pub cancelled: u64,
}

impl JobStats {
    /// Add `count` jobs in `status`.
    pub fn record(&mut self, status: JobStatus, count: u64) {
        match status {
            JobStatus::Pending => self.pending += count,
            JobStatus::Running => self.running += count,
            JobStatus::Completed => self.completed += count,
            JobStatus::Dead => self.dead += count,
            JobStatus::Cancelled => self.cancelled += count,
        }
    }

    /// Total across all statuses.
    pub fn total(&self) -> u64 {
        self.pending + self.running + self.completed + self.dead + self.cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_pending_claimable_once_due() {
        let now = Utc::now();
        let job = CreateJob::new("alert_reminder", "reminders", serde_json::json!({}), 5)
            .deliver_at(now + Duration::seconds(30))
            .into_job(now);
        assert!(!job.is_claimable(now));
        assert!(job.is_claimable(now + Duration::seconds(30)));
    }

    #[test]
    fn test_running_claimable_after_lease_expiry() {
        let now = Utc::now();
        let mut job = CreateJob::new("alert_reminder", "reminders", serde_json::json!({}), 5)
            .into_job(now);
        job.status = JobStatus::Running;
        job.worker_id = Some("w1".into());
        job.attempts = 1;
        job.locked_until = Some(now + Duration::seconds(60));

        assert!(job.is_held_by("w1", 1));
        assert!(!job.is_held_by("w1", 2));
        assert!(!job.is_held_by("w2", 1));
        assert!(!job.is_claimable(now));
        assert!(job.is_claimable(now + Duration::seconds(61)));
    }

    #[test]
    fn test_stats_total() {
        let mut stats = JobStats::default();
        stats.record(JobStatus::Pending, 3);
        stats.record(JobStatus::Dead, 1);
        assert_eq!(stats.total(), 4);
    }
}
