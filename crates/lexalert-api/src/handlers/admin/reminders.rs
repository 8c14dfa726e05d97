//! Reminder maintenance handlers.

use axum::Json;
use axum::extract::State;

use lexalert_worker::jobs::ReconcileReport;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::state::AppState;

/// POST /api/admin/reminders/reconcile
///
/// Runs a full sweep inline and reports what it scheduled.
pub async fn reconcile(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<ApiResponse<ReconcileReport>>, ApiError> {
    let report = state.job_admin.reconcile().await?;
    tracing::info!(
        admin_id = %admin.user_id,
        examined = report.examined,
        scheduled = report.scheduled,
        dead_lettered = report.dead_lettered,
        "Manual reminder reconcile"
    );
    Ok(Json(ApiResponse::ok(report)))
}
