//! Job repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use lexalert_core::error::ErrorKind;
use lexalert_core::result::AppResult;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_entity::job::{CreateJob, Job, JobStats, JobStatus};

use super::db_error;
use crate::traits::JobStore;

/// PostgreSQL-backed [`JobStore`].
///
/// Claims use `FOR UPDATE SKIP LOCKED` so concurrent workers never lease
/// the same row.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_replacing(&self, data: &CreateJob) -> AppResult<Job> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        if let Some(key) = &data.dedup_key {
            let replaced = sqlx::query(
                "UPDATE jobs SET status = 'cancelled', error_message = 'superseded', \
                 completed_at = NOW(), updated_at = NOW() \
                 WHERE dedup_key = $1 AND status = 'pending'",
            )
            .bind(key)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to replace pending job"))?;

            if replaced.rows_affected() > 0 {
                debug!(dedup_key = %key, "Replaced pending job");
            }
        }

        let job = sqlx::query_as::<_, Job>(
            "INSERT INTO jobs (id, job_type, queue, dedup_key, payload, max_attempts, scheduled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&data.job_type)
        .bind(&data.queue)
        .bind(data.dedup_key.as_deref())
        .bind(&data.payload)
        .bind(data.max_attempts)
        .bind(data.scheduled_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error("Failed to create job"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit job insert"))?;
        Ok(job)
    }
}

#[async_trait]
impl JobStore for JobRepository {
    async fn insert(&self, data: &CreateJob) -> AppResult<Job> {
        match self.insert_replacing(data).await {
            // A concurrent insert under the same key won the unique index;
            // one more pass replaces it.
            Err(e) if e.kind == ErrorKind::Conflict => self.insert_replacing(data).await,
            other => other,
        }
    }

    async fn claim_next(
        &self,
        queues: &[String],
        worker_id: &str,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'running', attempts = attempts + 1, worker_id = $2, \
                locked_until = $3, started_at = $4, updated_at = $4 \
             WHERE id = ( \
                SELECT id FROM jobs \
                WHERE queue = ANY($1) \
                  AND ((status = 'pending' AND scheduled_at <= $4) \
                    OR (status = 'running' AND locked_until < $4)) \
                ORDER BY scheduled_at ASC \
                LIMIT 1 \
                FOR UPDATE SKIP LOCKED \
             ) RETURNING *",
        )
        .bind(queues)
        .bind(worker_id)
        .bind(now + lease)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to claim job"))
    }

    async fn complete(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        result: Option<&serde_json::Value>,
    ) -> AppResult<bool> {
        let done = sqlx::query(
            "UPDATE jobs SET status = 'completed', result = $4, locked_until = NULL, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND worker_id = $2 AND attempts = $3 AND status = 'running'",
        )
        .bind(job_id)
        .bind(worker_id)
        .bind(attempt)
        .bind(result)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to complete job"))?;
        Ok(done.rows_affected() > 0)
    }

    async fn reschedule(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        run_at: DateTime<Utc>,
        error: &str,
    ) -> AppResult<bool> {
        // A newer pending job under the same key supersedes this retry.
        let done = sqlx::query(
            "UPDATE jobs SET \
                status = CASE WHEN dedup_key IS NOT NULL AND EXISTS ( \
                    SELECT 1 FROM jobs newer \
                    WHERE newer.dedup_key = jobs.dedup_key AND newer.status = 'pending' \
                      AND newer.id <> jobs.id \
                ) THEN 'cancelled'::job_status ELSE 'pending'::job_status END, \
                scheduled_at = $4, error_message = $5, locked_until = NULL, updated_at = NOW() \
             WHERE id = $1 AND worker_id = $2 AND attempts = $3 AND status = 'running'",
        )
        .bind(job_id)
        .bind(worker_id)
        .bind(attempt)
        .bind(run_at)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to reschedule job"))?;
        Ok(done.rows_affected() > 0)
    }

    async fn dead_letter(
        &self,
        job_id: Uuid,
        worker_id: &str,
        attempt: i32,
        error: &str,
    ) -> AppResult<bool> {
        let done = sqlx::query(
            "UPDATE jobs SET status = 'dead', error_message = $4, locked_until = NULL, \
             completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND worker_id = $2 AND attempts = $3 AND status = 'running'",
        )
        .bind(job_id)
        .bind(worker_id)
        .bind(attempt)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to dead-letter job"))?;
        Ok(done.rows_affected() > 0)
    }

    async fn cancel(&self, job_id: Uuid) -> AppResult<bool> {
        let done = sqlx::query(
            "UPDATE jobs SET status = 'cancelled', completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to cancel job"))?;
        Ok(done.rows_affected() > 0)
    }

    async fn cancel_by_key(&self, dedup_key: &str) -> AppResult<u64> {
        let done = sqlx::query(
            "UPDATE jobs SET status = 'cancelled', completed_at = NOW(), updated_at = NOW() \
             WHERE dedup_key = $1 AND status = 'pending'",
        )
        .bind(dedup_key)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to cancel job by key"))?;
        Ok(done.rows_affected())
    }

    async fn find_by_id(&self, job_id: Uuid) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find job"))
    }

    async fn find_active_by_key(&self, dedup_key: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE dedup_key = $1 AND status IN ('pending', 'running') \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(dedup_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find active job"))
    }

    async fn find_latest_by_key(&self, dedup_key: &str) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE dedup_key = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(dedup_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find latest job"))
    }

    async fn list(
        &self,
        status: Option<JobStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Job>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM jobs WHERE ($1::job_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count jobs"))?;

        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE ($1::job_status IS NULL OR status = $1) \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(status)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list jobs"))?;

        Ok(PageResponse::new(jobs, page, total as u64))
    }

    async fn count_by_status(&self) -> AppResult<JobStats> {
        let rows: Vec<(JobStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to count jobs by status"))?;

        let mut stats = JobStats::default();
        for (status, count) in rows {
            stats.record(status, count as u64);
        }
        Ok(stats)
    }

    async fn revive(&self, job_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>(
            "UPDATE jobs SET status = 'pending', attempts = 0, error_message = NULL, result = NULL, \
                scheduled_at = $2, locked_until = NULL, worker_id = NULL, started_at = NULL, \
                completed_at = NULL, updated_at = $2 \
             WHERE id = $1 AND status = 'dead' \
             RETURNING *",
        )
        .bind(job_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to revive job"))
    }

    async fn purge_finished(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let done = sqlx::query(
            "DELETE FROM jobs WHERE status IN ('completed', 'cancelled') AND updated_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to purge jobs"))?;
        Ok(done.rows_affected())
    }
}
