//! Route definitions for the LexAlert HTTP API.
//!
//! All routes are mounted under `/api`.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the API router. State is attached by [`crate::app::build_app`].
pub fn build_router() -> Router<AppState> {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(alert_routes())
        .merge(admin_routes());

    Router::new().nest("/api", api_routes)
}

/// Health endpoint
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Alert CRUD and lifecycle transitions
fn alert_routes() -> Router<AppState> {
    use handlers::alerts;

    Router::new()
        .route(
            "/alerts",
            get(alerts::list_alerts).post(alerts::create_alert),
        )
        .route(
            "/alerts/{id}",
            get(alerts::get_alert)
                .put(alerts::update_alert)
                .delete(alerts::delete_alert),
        )
        .route("/alerts/{id}/acknowledge", post(alerts::acknowledge_alert))
        .route("/alerts/{id}/resolve", post(alerts::resolve_alert))
        .route("/alerts/{id}/dismiss", post(alerts::dismiss_alert))
}

/// Admin endpoints: job queue and reminder maintenance
fn admin_routes() -> Router<AppState> {
    use handlers::admin::{jobs, reminders};

    Router::new()
        .route("/admin/jobs", get(jobs::list_jobs))
        .route("/admin/jobs/stats", get(jobs::job_stats))
        .route("/admin/jobs/{id}", get(jobs::get_job))
        .route("/admin/jobs/{id}/retry", post(jobs::retry_job))
        .route("/admin/jobs/{id}/cancel", post(jobs::cancel_job))
        .route("/admin/reminders/reconcile", post(reminders::reconcile))
}
