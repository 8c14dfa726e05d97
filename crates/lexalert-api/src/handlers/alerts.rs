//! Alert handlers. Every route is scoped to the authenticated owner.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use lexalert_core::types::pagination::PageResponse;
use lexalert_entity::alert::{Alert, UpdateAlert};

use crate::dto::request::{AlertListQuery, CreateAlertBody};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AlertListQuery>,
) -> Result<Json<ApiResponse<PageResponse<Alert>>>, ApiError> {
    let page = state
        .alert_service
        .list(&auth, &query.filter(), &query.page_request())
        .await?;
    Ok(Json(ApiResponse::ok(page)))
}

/// POST /api/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateAlertBody>,
) -> Result<(StatusCode, Json<ApiResponse<Alert>>), ApiError> {
    body.validate()?;
    let alert = state.alert_service.create(&auth, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(alert))))
}

/// GET /api/alerts/{id}
pub async fn get_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.get(&auth, id).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// PUT /api/alerts/{id}
pub async fn update_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UpdateAlert>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.update(&auth, id, patch).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// DELETE /api/alerts/{id}
pub async fn delete_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.alert_service.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Alert deleted"))))
}

/// POST /api/alerts/{id}/acknowledge
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.acknowledge(&auth, id).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// POST /api/alerts/{id}/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.resolve(&auth, id).await?;
    Ok(Json(ApiResponse::ok(alert)))
}

/// POST /api/alerts/{id}/dismiss
pub async fn dismiss_alert(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Alert>>, ApiError> {
    let alert = state.alert_service.dismiss(&auth, id).await?;
    Ok(Json(ApiResponse::ok(alert)))
}
