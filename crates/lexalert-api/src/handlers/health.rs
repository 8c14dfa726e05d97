//! Health check handler.

use axum::Json;
use axum::extract::State;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let (status, database) = match &state.db {
        Some(db) => match db.health_check().await {
            Ok(()) => ("ok", "connected"),
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                ("degraded", "unavailable")
            }
        },
        None => ("ok", "memory"),
    };

    Json(ApiResponse::ok(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        database: database.to_string(),
    }))
}
