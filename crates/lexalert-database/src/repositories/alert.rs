//! Alert repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use lexalert_core::result::AppResult;
use lexalert_core::types::pagination::{PageRequest, PageResponse};
use lexalert_entity::alert::{Alert, AlertFilter, AlertTransition, CreateAlert, UpdateAlert};

use super::db_error;
use crate::traits::AlertStore;

/// PostgreSQL-backed [`AlertStore`].
#[derive(Debug, Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Create a new alert repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for AlertRepository {
    async fn create(&self, data: &CreateAlert) -> AppResult<Alert> {
        sqlx::query_as::<_, Alert>(
            "INSERT INTO alerts (id, owner_id, title, description, category, priority, due_date, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(data.owner_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.category)
        .bind(data.priority)
        .bind(data.due_date)
        .bind(&data.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create alert"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>("SELECT * FROM alerts WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find alert"))
    }

    async fn find_for_owner(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>(
            "SELECT * FROM alerts WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find alert"))
    }

    async fn list_for_owner(
        &self,
        owner_id: Uuid,
        filter: &AlertFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Alert>> {
        const WHERE: &str = "WHERE owner_id = $1 AND deleted_at IS NULL \
             AND ($2::alert_status IS NULL OR status = $2) \
             AND ($3::alert_category IS NULL OR category = $3) \
             AND ($4::alert_priority IS NULL OR priority = $4)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM alerts {WHERE}"))
            .bind(owner_id)
            .bind(filter.status)
            .bind(filter.category)
            .bind(filter.priority)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count alerts"))?;

        let alerts = sqlx::query_as::<_, Alert>(&format!(
            "SELECT * FROM alerts {WHERE} \
             ORDER BY due_date ASC NULLS LAST, created_at ASC \
             LIMIT $5 OFFSET $6"
        ))
        .bind(owner_id)
        .bind(filter.status)
        .bind(filter.category)
        .bind(filter.priority)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list alerts"))?;

        Ok(PageResponse::new(alerts, page, total as u64))
    }

    async fn update_details(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &UpdateAlert,
    ) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>(
            "UPDATE alerts SET \
                title = COALESCE($3, title), \
                description = COALESCE($4, description), \
                category = COALESCE($5, category), \
                priority = COALESCE($6, priority), \
                metadata = COALESCE($7, metadata), \
                reminder_job_id = CASE WHEN $8 AND due_date IS DISTINCT FROM $9 THEN NULL ELSE reminder_job_id END, \
                reminder_sent_at = CASE WHEN $8 AND due_date IS DISTINCT FROM $9 THEN NULL ELSE reminder_sent_at END, \
                due_date = CASE WHEN $8 THEN $9 ELSE due_date END, \
                updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(id)
        .bind(owner_id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.category)
        .bind(patch.priority)
        .bind(patch.metadata.as_ref())
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update alert"))
    }

    async fn transition_status(
        &self,
        id: Uuid,
        owner_id: Option<Uuid>,
        transition: AlertTransition,
        actor: Option<Uuid>,
    ) -> AppResult<Option<Alert>> {
        let eligible: Vec<String> = transition
            .eligible_from()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        sqlx::query_as::<_, Alert>(
            "UPDATE alerts SET \
                status = $3, \
                resolved_at = CASE WHEN $4 THEN NOW() ELSE resolved_at END, \
                resolved_by = CASE WHEN $4 THEN $5 ELSE resolved_by END, \
                updated_at = NOW() \
             WHERE id = $1 AND ($2::uuid IS NULL OR owner_id = $2) \
               AND deleted_at IS NULL AND status::text = ANY($6) \
             RETURNING *",
        )
        .bind(id)
        .bind(owner_id)
        .bind(transition.target())
        .bind(transition.closes())
        .bind(actor)
        .bind(&eligible)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update alert status"))
    }

    async fn record_reminder_sent(
        &self,
        id: Uuid,
        job_id: Uuid,
        sent_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE alerts SET reminder_job_id = $2, reminder_sent_at = $3, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(job_id)
        .bind(sent_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record reminder"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: Uuid, owner_id: Uuid) -> AppResult<Option<Alert>> {
        sqlx::query_as::<_, Alert>(
            "UPDATE alerts SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to delete alert"))
    }

    async fn find_awaiting_reminder(
        &self,
        after: Option<Uuid>,
        limit: u32,
    ) -> AppResult<Vec<Alert>> {
        sqlx::query_as::<_, Alert>(
            "SELECT * FROM alerts \
             WHERE deleted_at IS NULL AND due_date IS NOT NULL AND reminder_sent_at IS NULL \
               AND status IN ('PENDING', 'ACKNOWLEDGED') \
               AND ($1::uuid IS NULL OR id > $1) \
             ORDER BY id ASC LIMIT $2",
        )
        .bind(after)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to find alerts awaiting reminders"))
    }
}
