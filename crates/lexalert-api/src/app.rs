//! Application builder: wires router, middleware and state into an Axum app.

use std::future::IntoFuture;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use lexalert_core::error::AppError;

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);

    build_router()
        .layer(build_compression_layer())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(request_logging))
        .with_state(state)
}

/// Serves `app` on `listener` until `shutdown` flips to `true`.
///
/// Open connections get `grace` to finish after the signal; whatever is
/// still running then is dropped.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: watch::Receiver<bool>,
    grace: Duration,
) -> Result<(), AppError> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::internal(format!("Failed to read listener address: {e}")))?;
    tracing::info!(address = %addr, "HTTP server listening");

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown.clone()))
        .into_future();

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("HTTP server error: {e}")))
        }
        _ = async {
            wait_for_shutdown(shutdown).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Shutdown grace elapsed, dropping open connections");
            Ok(())
        }
    }
}

async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
