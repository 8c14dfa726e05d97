//! LexAlert server: HTTP API, reminder worker and periodic schedules in one
//! process.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use lexalert_api::{AppState, build_app, serve};
use lexalert_core::config::AppConfig;
use lexalert_core::error::AppError;
use lexalert_database::DatabasePool;
use lexalert_service::{Services, Stores};
use lexalert_worker::CronScheduler;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Load `config/default.toml`, the `LEXALERT_ENV` overlay and environment
/// overrides.
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("LEXALERT_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing. `RUST_LOG` takes precedence over `logging.level`.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.is_json() {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting LexAlert");

    let db = DatabasePool::connect(&config.database).await?;
    let services = Services::from_config(&config, Stores::postgres(&db))?;
    tracing::info!(worker_id = services.queue.worker_id(), "Services initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut background = None;
    if config.worker.enabled {
        let runner = services.runner(&config);
        let worker_shutdown = shutdown_rx.clone();
        let handle = tokio::spawn(async move { runner.run(worker_shutdown).await });

        let scheduler = CronScheduler::new(Arc::clone(&services.queue)).await?;
        scheduler.register_default_tasks(&config.reminder).await?;
        scheduler.start().await?;

        background = Some((handle, scheduler));
    } else {
        tracing::info!("Background worker disabled");
    }

    let state = AppState::new(
        Arc::new(config.clone()),
        Arc::clone(&services.alerts),
        Arc::clone(&services.job_admin),
        Some(db.clone()),
    );
    let app = build_app(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown");
        let _ = shutdown_tx.send(true);
    });

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    serve(listener, app, shutdown_rx, grace).await?;

    if let Some((handle, mut scheduler)) = background {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Cron scheduler did not shut down cleanly");
        }
        // The runner bounds its own drain; this only guards against a hang.
        let limit = Duration::from_secs(config.worker.shutdown_grace_seconds + 5);
        if tokio::time::timeout(limit, handle).await.is_err() {
            tracing::warn!("Worker did not stop in time");
        }
    }

    db.close().await;
    tracing::info!("LexAlert shut down gracefully");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
