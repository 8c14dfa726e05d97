//! Shared application state passed to all handlers.

use std::sync::Arc;
use std::time::Instant;

use lexalert_core::config::AppConfig;
use lexalert_database::DatabasePool;
use lexalert_service::{AlertService, JobAdminService};

use crate::jwt::JwtVerifier;

/// Application state shared across all Axum handlers via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Bearer token verifier.
    pub jwt: Arc<JwtVerifier>,
    /// Alert service.
    pub alert_service: Arc<AlertService>,
    /// Job administration service.
    pub job_admin: Arc<JobAdminService>,
    /// Database pool, absent when running on in-memory stores.
    pub db: Option<DatabasePool>,
    /// Process start, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    /// Assembles the state from already-constructed services.
    pub fn new(
        config: Arc<AppConfig>,
        alert_service: Arc<AlertService>,
        job_admin: Arc<JobAdminService>,
        db: Option<DatabasePool>,
    ) -> Self {
        let jwt = Arc::new(JwtVerifier::new(&config.auth));
        Self {
            config,
            jwt,
            alert_service,
            job_admin,
            db,
            started_at: Instant::now(),
        }
    }
}
