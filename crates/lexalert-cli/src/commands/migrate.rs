//! Database migration command.

use lexalert_core::config::AppConfig;
use lexalert_core::error::AppError;
use lexalert_database::DatabasePool;
use lexalert_database::migration::run_migrations;

use crate::output;

/// Apply all pending migrations.
pub async fn execute(config: &AppConfig) -> Result<(), AppError> {
    let mut database = config.database.clone();
    // Applied explicitly below so the outcome is reported here.
    database.run_migrations = false;
    let db = DatabasePool::connect(&database).await?;

    println!("Running database migrations...");
    let result = run_migrations(&db.pool()).await;
    db.close().await;
    result?;

    output::print_success("All migrations applied successfully.");
    Ok(())
}
