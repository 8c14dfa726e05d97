//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod notifier;
pub mod reminder;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::notifier::{NotifierConfig, NotifierProvider};
pub use self::reminder::ReminderConfig;
pub use self::worker::{RetryConfig, WorkerConfig};

use crate::error::AppError;

/// Prefix for environment variable overrides, e.g. `LEXALERT__DATABASE__URL`.
const ENV_PREFIX: &str = "LEXALERT";

/// Upper bound for `reminder.job_retention_days`.
pub const MAX_RETENTION_DAYS: i64 = 36_500;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Reminder scheduling settings.
    #[serde(default)]
    pub reminder: ReminderConfig,
    /// Email provider settings.
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for an environment.
    ///
    /// Merges `config/default`, the `config/{env}` overlay, and environment
    /// variables prefixed with `LEXALERT__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false));
        Self::finish(builder)
    }

    /// Load configuration from one explicit file plus environment overrides.
    pub fn load_file(path: &str) -> Result<Self, AppError> {
        let builder =
            config::Config::builder().add_source(config::File::with_name(path).required(true));
        Self::finish(builder)
    }

    /// Parse configuration from a TOML string (no environment overrides).
    pub fn from_toml(contents: &str) -> Result<Self, AppError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that deserialize but cannot work together.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.notifier.send_timeout_seconds >= self.worker.lease_seconds {
            return Err(AppError::configuration(format!(
                "notifier.send_timeout_seconds ({}) must be shorter than worker.lease_seconds ({})",
                self.notifier.send_timeout_seconds, self.worker.lease_seconds
            )));
        }
        if !(0..=MAX_RETENTION_DAYS).contains(&self.reminder.job_retention_days) {
            return Err(AppError::configuration(format!(
                "reminder.job_retention_days must be between 0 and {MAX_RETENTION_DAYS}, got {}",
                self.reminder.job_retention_days
            )));
        }
        Ok(())
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, AppError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
