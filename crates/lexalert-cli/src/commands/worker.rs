//! Worker management CLI commands.

use chrono::Utc;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use lexalert_core::config::AppConfig;
use lexalert_core::error::AppError;
use lexalert_worker::JobOutcome;

use crate::output::{self, OutputFormat};

/// Arguments for worker commands
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Worker subcommand
    #[command(subcommand)]
    pub command: WorkerCommand,
}

/// Worker subcommands
#[derive(Debug, Subcommand)]
pub enum WorkerCommand {
    /// Show queue counts and worker settings
    Status,
    /// Process every job that is due now, then exit
    Drain,
}

/// Result of one job processed by `worker drain`.
#[derive(Debug, Serialize, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Job")]
    job_id: Uuid,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

fn describe(outcome: &JobOutcome) -> String {
    match outcome {
        JobOutcome::Completed => "completed".to_string(),
        JobOutcome::Rescheduled { run_at } => format!("retry at {}", run_at.format("%H:%M:%S")),
        JobOutcome::DeadLettered => "dead".to_string(),
        JobOutcome::LeaseLost => "lease lost".to_string(),
    }
}

/// Execute worker commands
pub async fn execute(
    args: &WorkerArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (db, services) = super::connect(config).await?;

    let result = match &args.command {
        WorkerCommand::Status => services.job_admin.stats().await.map(|stats| match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&stats).unwrap_or_default();
                println!("{json}");
            }
            OutputFormat::Table => {
                println!("Job Queue Status:");
                output::print_kv("Pending", &stats.counts.pending.to_string());
                output::print_kv("Running", &stats.counts.running.to_string());
                output::print_kv("Completed", &stats.counts.completed.to_string());
                output::print_kv("Dead", &stats.counts.dead.to_string());
                output::print_kv("Cancelled", &stats.counts.cancelled.to_string());
                output::print_kv("Worker Enabled", &config.worker.enabled.to_string());
                output::print_kv("Concurrency", &config.worker.concurrency.to_string());
                output::print_kv(
                    "Max Attempts",
                    &config.worker.retry.max_attempts.to_string(),
                );
            }
        }),
        WorkerCommand::Drain => {
            let runner = services.runner(config);
            runner.drain(Utc::now()).await.map(|outcomes| {
                let rows: Vec<OutcomeRow> = outcomes
                    .iter()
                    .map(|(job_id, outcome)| OutcomeRow {
                        job_id: *job_id,
                        outcome: describe(outcome),
                    })
                    .collect();
                output::print_list(&rows, format);
            })
        }
    };

    db.close().await;
    result
}
