//! In-memory job store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use lexalert_core::AppError;
use lexalert_core::result::AppResult;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_entity::job::{CreateJob, Job, JobStats, JobStatus};

use crate::traits::JobStore;

/// [`JobStore`] over a mutex-guarded map.
///
/// One lock covers the whole table so a claim is a single critical section.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobStore {
    jobs: Arc<Mutex<HashMap<Uuid, Job>>>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every job, oldest first.
    pub async fn all(&self) -> Vec<Job> {
        let jobs = self.jobs.lock().await;
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by_key(|j| j.created_at);
        all
    }
}

fn pending_with_key<'a>(
    jobs: &'a mut HashMap<Uuid, Job>,
    key: &'a str,
) -> impl Iterator<Item = &'a mut Job> + 'a {
    jobs.values_mut()
        .filter(move |j| j.status == JobStatus::Pending && j.dedup_key.as_deref() == Some(key))
}

fn held<'a>(
    jobs: &'a mut HashMap<Uuid, Job>,
    job_id: Uuid,
    worker_id: &str,
    attempt: i32,
) -> Option<&'a mut Job> {
    jobs.get_mut(&job_id).filter(|j| j.is_held_by(worker_id, attempt))
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn insert(&self, data: &CreateJob) -> AppResult<Job> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().await;

        if let Some(key) = &data.dedup_key {
            for old in pending_with_key(&mut jobs, key) {
                old.status = JobStatus::Cancelled;
                old.error_message = Some("superseded".into());
                old.completed_at = Some(now);
                old.updated_at = now;
            }
        }

        let job = data.clone().into_job(now);
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn claim_next(
        &self,
        queues: &[String],
        worker_id: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Job>> {
        let mut jobs = self.jobs.lock().await;
        let next = jobs
            .values()
            .filter(|j| queues.iter().any(|q| *q == j.queue) && j.is_claimable(now))
            .min_by_key(|j| (j.scheduled_at, j.created_at))
            .map(|j| j.id);

        let Some(job) = next.and_then(|id| jobs.get_mut(&id)) else {
            return Ok(None);
        };
        job.status = JobStatus::Running;
        job.attempts += 1;
        job.worker_id = Some(worker_id.to_string());
        job.locked_until = Some(now + lease);
        job.started_at = Some(now);
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn complete(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        result: Option<&serde_json::Value>,
    ) -> AppResult<bool> {
        let mut jobs = self.jobs.lock().await;
        let Some(job) = held(&mut jobs, job_id, worker_id, attempt) else {
            return Ok(false);
        };
        let now = Utc::now();
        job.status = JobStatus::Completed;
        job.result = result.cloned();
        job.locked_until = None;
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn reschedule(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        run_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<bool> {
        let mut jobs = self.jobs.lock().await;
        let superseded = match jobs.get(&job_id).and_then(|j| j.dedup_key.clone()) {
            Some(key) => jobs.values().any(|other| {
                other.id != job_id
                    && other.status == JobStatus::Pending
                    && other.dedup_key.as_deref() == Some(key.as_str())
            }),
            None => false,
        };

        let Some(job) = held(&mut jobs, job_id, worker_id, attempt) else {
            return Ok(false);
        };
        job.status = if superseded {
            JobStatus::Cancelled
        } else {
            JobStatus::Pending
        };
        job.scheduled_at = run_at;
        job.error_message = Some(error.to_string());
        job.locked_until = None;
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn dead_letter(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        error: &str,
    ) -> AppResult<bool> {
        let mut jobs = self.jobs.lock().await;
        let Some(job) = held(&mut jobs, job_id, worker_id, attempt) else {
            return Ok(false);
        };
        let now = Utc::now();
        job.status = JobStatus::Dead;
        job.error_message = Some(error.to_string());
        job.locked_until = None;
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn cancel(&self, job_id: Uuid) -> AppResult<bool> {
        let mut jobs = self.jobs.lock().await;
        let Some(job) = jobs
            .get_mut(&job_id)
            .filter(|j| j.status == JobStatus::Pending)
        else {
            return Ok(false);
        };
        let now = Utc::now();
        job.status = JobStatus::Cancelled;
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(true)
    }

    async fn cancel_by_key(&self, dedup_key: &str) -> AppResult<u64> {
        let now = Utc::now();
        let mut jobs = self.jobs.lock().await;
        let mut cancelled = 0;
        for job in pending_with_key(&mut jobs, dedup_key) {
            job.status = JobStatus::Cancelled;
            job.completed_at = Some(now);
            job.updated_at = now;
            cancelled += 1;
        }
        Ok(cancelled)
    }

    async fn find_by_id(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        Ok(self.jobs.lock().await.get(&job_id).cloned())
    }

    async fn find_active_by_key(&self, dedup_key: &str) -> AppResult<Option<Job>> {
        let jobs = self.jobs.lock().await;
        Ok(jobs
            .values()
            .filter(|j| j.status.is_active() && j.dedup_key.as_deref() == Some(dedup_key))
            .max_by_key(|j| j.created_at)
            .cloned())
    }

    async fn find_latest_by_key(&self, dedup_key: &str) -> AppResult<Option<Job>> {
        let jobs = self.jobs.lock().await;
        Ok(jobs
            .values()
            .filter(|j| j.dedup_key.as_deref() == Some(dedup_key))
            .max_by_key(|j| (j.created_at, j.id))
            .cloned())
    }

    async fn list(
        &self,
        status: Option<JobStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>> {
        let jobs = self.jobs.lock().await;
        let mut matching: Vec<Job> = jobs
            .values()
            .filter(|j| status.is_none_or(|s| j.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PageResponse::from_sorted(matching, page))
    }

    async fn count_by_status(&self) -> AppResult<JobStats> {
        let jobs = self.jobs.lock().await;
        let mut stats = JobStats::default();
        for job in jobs.values() {
            stats.record(job.status, 1);
        }
        Ok(stats)
    }

    async fn revive(&self, job_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Job>> {
        let mut jobs = self.jobs.lock().await;
        let Some(key) = jobs
            .get(&job_id)
            .filter(|j| j.status.can_revive())
            .map(|j| j.dedup_key.clone())
        else {
            return Ok(None);
        };

        if let Some(key) = key {
            let occupied = jobs.values().any(|other| {
                other.status == JobStatus::Pending && other.dedup_key.as_deref() == Some(key.as_str())
            });
            if occupied {
                return Err(AppError::conflict(format!(
                    "A pending job already holds key '{key}'"
                )));
            }
        }

        let Some(job) = jobs.get_mut(&job_id) else {
            return Ok(None);
        };
        job.status = JobStatus::Pending;
        job.attempts = 0;
        job.error_message = None;
        job.result = None;
        job.scheduled_at = now;
        job.locked_until = None;
        job.worker_id = None;
        job.started_at = None;
        job.completed_at = None;
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let mut jobs = self.jobs.lock().await;
        let before_len = jobs.len();
        jobs.retain(|_, j| {
            !(matches!(j.status, JobStatus::Completed | JobStatus::Cancelled)
                && j.updated_at < before)
        });
        Ok((before_len - jobs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexalert_core::error::ErrorKind;

    const WORKER: &str = "worker-a";

    fn queues() -> Vec<String> {
        vec!["reminders".to_string()]
    }

    fn reminder(key: &str) -> CreateJob {
        CreateJob::new("alert_reminder", "reminders", serde_json::json!({}), 3)
            .with_dedup_key(key)
    }

    #[tokio::test]
    async fn test_insert_replaces_pending_job_with_same_key() {
        let store = MemoryJobStore::new();
        let first = store.insert(&reminder("reminder:a")).await.unwrap();
        let second = store.insert(&reminder("reminder:a")).await.unwrap();

        let first = store.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(first.status, JobStatus::Cancelled);
        let active = store.find_active_by_key("reminder:a").await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
    }

    #[tokio::test]
    async fn test_future_job_is_not_claimed_early() {
        let store = MemoryJobStore::new();
        let now = Utc::now();
        store
            .insert(&reminder("k").deliver_at(now + Duration::minutes(5)))
            .await
            .unwrap();

        let lease = Duration::seconds(60);
        assert!(store.claim_next(&queues(), WORKER, lease, now).await.unwrap().is_none());
        let claimed = store
            .claim_next(&queues(), WORKER, lease, now + Duration::minutes(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(claimed.attempts, 1);
        assert_eq!(claimed.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn test_expired_lease_is_redelivered_to_another_worker() {
        let store = MemoryJobStore::new();
        let job = store.insert(&reminder("k")).await.unwrap();
        let now = Utc::now();
        let lease = Duration::seconds(30);

        store.claim_next(&queues(), WORKER, lease, now).await.unwrap().unwrap();
        assert!(store.claim_next(&queues(), "worker-b", lease, now).await.unwrap().is_none());

        let later = now + Duration::seconds(31);
        let again = store
            .claim_next(&queues(), "worker-b", lease, later)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(again.id, job.id);
        assert_eq!(again.attempts, 2);

        // The first worker lost its lease.
        assert!(!store.complete(job.id, WORKER, 1, None).await.unwrap());
        assert!(store.complete(job.id, "worker-b", 2, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_reschedule_superseded_retry_is_cancelled() {
        let store = MemoryJobStore::new();
        let job = store.insert(&reminder("k")).await.unwrap();
        let now = Utc::now();
        store
            .claim_next(&queues(), WORKER, Duration::seconds(30), now)
            .await
            .unwrap();
        store.insert(&reminder("k")).await.unwrap();

        assert!(store.reschedule(job.id, WORKER, 1, now, "smtp down").await.unwrap());
        let job = store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_revive_dead_job() {
        let store = MemoryJobStore::new();
        let job = store.insert(&reminder("k")).await.unwrap();
        let now = Utc::now();
        store
            .claim_next(&queues(), WORKER, Duration::seconds(30), now)
            .await
            .unwrap();
        store.dead_letter(job.id, WORKER, 1, "owner missing").await.unwrap();

        let revived = store.revive(job.id, now).await.unwrap().unwrap();
        assert_eq!(revived.status, JobStatus::Pending);
        assert_eq!(revived.attempts, 0);
        assert!(store.revive(job.id, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revive_conflicts_with_newer_pending_job() {
        let store = MemoryJobStore::new();
        let job = store.insert(&reminder("k")).await.unwrap();
        let now = Utc::now();
        store
            .claim_next(&queues(), WORKER, Duration::seconds(30), now)
            .await
            .unwrap();
        store.dead_letter(job.id, WORKER, 1, "boom").await.unwrap();
        store.insert(&reminder("k")).await.unwrap();

        let err = store.revive(job.id, now).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_purge_keeps_dead_jobs() {
        let store = MemoryJobStore::new();
        let dead = store.insert(&reminder("a")).await.unwrap();
        let done = store.insert(&reminder("b")).await.unwrap();
        let now = Utc::now();
        let lease = Duration::seconds(30);
        store.claim_next(&queues(), WORKER, lease, now).await.unwrap();
        store.claim_next(&queues(), WORKER, lease, now).await.unwrap();
        store.dead_letter(dead.id, WORKER, 1, "x").await.unwrap();
        store.complete(done.id, WORKER, 1, None).await.unwrap();

        let purged = store
            .purge_finished(Utc::now() + Duration::seconds(1))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert!(store.find_by_id(dead.id).await.unwrap().is_some());
        assert_eq!(store.count_by_status().await.unwrap().dead, 1);
    }

    #[tokio::test]
    async fn test_same_worker_reclaim_fences_out_stale_claim() {
        let store = MemoryJobStore::new();
        let job = store.insert(&reminder("k")).await.unwrap();
        let now = Utc::now();
        let lease = Duration::seconds(30);

        let stale = store.claim_next(&queues(), WORKER, lease, now).await.unwrap().unwrap();
        let live = store
            .claim_next(&queues(), WORKER, lease, now + Duration::minutes(5))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((stale.attempts, live.attempts), (1, 2));

        assert!(!store.complete(job.id, WORKER, stale.attempts, None).await.unwrap());
        assert!(!store.dead_letter(job.id, WORKER, stale.attempts, "late").await.unwrap());
        assert!(!store.reschedule(job.id, WORKER, stale.attempts, now, "late").await.unwrap());
        assert!(store.complete(job.id, WORKER, live.attempts, None).await.unwrap());
        let job = store.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_latest_by_key_includes_finished_jobs() {
        let store = MemoryJobStore::new();
        let job = store.insert(&reminder("k")).await.unwrap();
        store
            .claim_next(&queues(), WORKER, Duration::seconds(30), Utc::now())
            .await
            .unwrap();
        store.dead_letter(job.id, WORKER, 1, "owner missing").await.unwrap();

        assert!(store.find_active_by_key("k").await.unwrap().is_none());
        let latest = store.find_latest_by_key("k").await.unwrap().unwrap();
        assert_eq!(latest.id, job.id);
        assert_eq!(latest.status, JobStatus::Dead);
        assert!(store.find_latest_by_key("other").await.unwrap().is_none());
    }
}
