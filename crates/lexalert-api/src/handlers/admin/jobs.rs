//! Job management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use lexalert_core::types::pagination::PageResponse;
use lexalert_entity::job::Job;
use lexalert_worker::QueueStats;

use crate::dto::request::JobListQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::state::AppState;

/// GET /api/admin/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<JobListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Job>>>, ApiError> {
    let page = state
        .job_admin
        .list(query.status, &query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// GET /api/admin/jobs/stats
pub async fn job_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<QueueStats>>, ApiError> {
    let stats = state.job_admin.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// GET /api/admin/jobs/{id}
pub async fn get_job(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let job = state.job_admin.get(id).await?;
    Ok(Json(ApiResponse::ok(job)))
}

/// POST /api/admin/jobs/{id}/retry
pub async fn retry_job(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let job = state.job_admin.retry(id).await?;
    tracing::info!(job_id = %id, admin_id = %admin.user_id, "Job retry requested");
    Ok(Json(ApiResponse::ok(job)))
}

/// POST /api/admin/jobs/{id}/cancel
pub async fn cancel_job(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Job>>, ApiError> {
    let job = state.job_admin.cancel(id).await?;
    tracing::info!(job_id = %id, admin_id = %admin.user_id, "Job cancel requested");
    Ok(Json(ApiResponse::ok(job)))
}
