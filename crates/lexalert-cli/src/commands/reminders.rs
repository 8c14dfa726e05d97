//! Reminder maintenance commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use lexalert_core::config::AppConfig;
use lexalert_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for reminder commands
#[derive(Debug, Args)]
pub struct RemindersArgs {
    /// Reminders subcommand
    #[command(subcommand)]
    pub command: RemindersCommand,
}

/// Reminder subcommands
#[derive(Debug, Subcommand)]
pub enum RemindersCommand {
    /// Schedule reminders for open alerts that have none
    Reconcile {
        /// Alerts read per page (defaults to `reminder.reconcile_batch_size`)
        #[arg(long)]
        batch_size: Option<u32>,
    },
}

#[derive(Debug, Serialize, Tabled)]
struct ReportRow {
    #[tabled(rename = "Examined")]
    examined: u64,
    #[tabled(rename = "Scheduled")]
    scheduled: u64,
    #[tabled(rename = "Dead-lettered")]
    dead_lettered: u64,
}

/// Execute reminder commands
pub async fn execute(
    args: &RemindersArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (db, services) = super::connect(config).await?;

    let result = match &args.command {
        RemindersCommand::Reconcile { batch_size } => {
            services.reconciler.run(*batch_size).await.map(|report| {
                output::print_item(
                    &ReportRow {
                        examined: report.examined,
                        scheduled: report.scheduled,
                        dead_lettered: report.dead_lettered,
                    },
                    format,
                );
            })
        }
    };

    db.close().await;
    result
}
