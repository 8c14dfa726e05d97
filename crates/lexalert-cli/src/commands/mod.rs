//! CLI command definitions and dispatch.

pub mod jobs;
pub mod migrate;
pub mod reminders;
pub mod worker;

use clap::{Parser, Subcommand};

use lexalert_core::config::AppConfig;
use lexalert_core::error::AppError;
use lexalert_database::DatabasePool;
use lexalert_service::{Services, Stores};

use crate::output::OutputFormat;

/// LexAlert: legal alert tracking and reminder delivery
#[derive(Debug, Parser)]
#[command(name = "lexalert", version, about, long_about = None)]
pub struct Cli {
    /// Explicit configuration file. Defaults to `config/default.toml` plus
    /// the `LEXALERT_ENV` overlay.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply database migrations
    Migrate,
    /// Worker status and one-shot processing
    Worker(worker::WorkerArgs),
    /// Job queue inspection and repair
    Jobs(jobs::JobsArgs),
    /// Reminder maintenance
    Reminders(reminders::RemindersArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = self.load_config()?;
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Worker(args) => worker::execute(args, &config, self.format).await,
            Commands::Jobs(args) => jobs::execute(args, &config, self.format).await,
            Commands::Reminders(args) => reminders::execute(args, &config, self.format).await,
        }
    }

    fn load_config(&self) -> Result<AppConfig, AppError> {
        match &self.config {
            Some(path) => AppConfig::load_file(path),
            None => {
                let env =
                    std::env::var("LEXALERT_ENV").unwrap_or_else(|_| "development".to_string());
                AppConfig::load(&env)
            }
        }
    }
}

/// Connect to the database and build the service graph on top of it.
pub async fn connect(config: &AppConfig) -> Result<(DatabasePool, Services), AppError> {
    let db = DatabasePool::connect(&config.database).await?;
    let services = Services::from_config(config, Stores::postgres(&db))?;
    Ok((db, services))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_jobs_list_with_status() {
        let cli = Cli::try_parse_from(["lexalert", "-f", "json", "jobs", "list", "--status", "dead"])
            .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Jobs(jobs::JobsArgs {
                command: jobs::JobsCommand::List { status, .. },
            }) => assert_eq!(status.as_deref(), Some("dead")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_job_id() {
        assert!(Cli::try_parse_from(["lexalert", "jobs", "retry", "not-a-uuid"]).is_err());
    }

    #[test]
    fn test_parses_worker_drain() {
        let cli = Cli::try_parse_from(["lexalert", "worker", "drain"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Worker(worker::WorkerArgs {
                command: worker::WorkerCommand::Drain
            })
        ));
    }
}
