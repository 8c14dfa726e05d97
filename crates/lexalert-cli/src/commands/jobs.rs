//! Job queue inspection and repair commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use lexalert_core::config::AppConfig;
use lexalert_core::error::AppError;
use lexalert_core::types::pagination::PageRequest;
use lexalert_entity::job::{Job, JobStatus};

use crate::output::{self, OutputFormat};

/// Arguments for job commands
#[derive(Debug, Args)]
pub struct JobsArgs {
    /// Jobs subcommand
    #[command(subcommand)]
    pub command: JobsCommand,
}

/// Job subcommands
#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// List jobs, newest first
    List {
        /// Only jobs in this status (pending, running, completed, dead, cancelled)
        #[arg(short, long)]
        status: Option<String>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Jobs per page
        #[arg(long, default_value_t = 25)]
        per_page: u64,
    },
    /// Re-queue a dead job with a fresh attempt budget
    Retry {
        /// Job ID
        id: Uuid,
    },
    /// Cancel a pending job
    Cancel {
        /// Job ID
        id: Uuid,
    },
}

/// One job as a table row.
#[derive(Debug, Serialize, Tabled)]
pub struct JobRow {
    /// Job ID
    #[tabled(rename = "ID")]
    pub id: Uuid,
    /// Job type
    #[tabled(rename = "Type")]
    pub job_type: String,
    /// Status
    #[tabled(rename = "Status")]
    pub status: String,
    /// `attempts/max_attempts`
    #[tabled(rename = "Attempts")]
    pub attempts: String,
    /// Next or last delivery time
    #[tabled(rename = "Scheduled")]
    pub scheduled_at: String,
    /// Last error
    #[tabled(rename = "Last Error")]
    pub error: String,
}

impl From<Job> for JobRow {
    fn from(job: Job) -> Self {
        Self {
            id: job.id,
            job_type: job.job_type,
            status: job.status.to_string(),
            attempts: format!("{}/{}", job.attempts, job.max_attempts),
            scheduled_at: job.scheduled_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            error: job.error_message.unwrap_or_default(),
        }
    }
}

/// Execute job commands
pub async fn execute(
    args: &JobsArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (db, services) = super::connect(config).await?;
    let admin = &services.job_admin;

    let result = match &args.command {
        JobsCommand::List {
            status,
            page,
            per_page,
        } => {
            let status = status
                .as_deref()
                .map(str::parse::<JobStatus>)
                .transpose()?;
            let page = admin.list(status, &PageRequest::new(*page, *per_page)).await;
            page.map(|page| {
                let rows: Vec<JobRow> = page.items.into_iter().map(JobRow::from).collect();
                output::print_list(&rows, format);
                if format == OutputFormat::Table {
                    println!(
                        "Page {}/{} ({} jobs)",
                        page.page, page.total_pages, page.total_items
                    );
                }
            })
        }
        JobsCommand::Retry { id } => admin.retry(*id).await.map(|job| {
            output::print_item(&JobRow::from(job), format);
            output::print_success(&format!("Job {id} re-queued"));
        }),
        JobsCommand::Cancel { id } => admin.cancel(*id).await.map(|job| {
            output::print_item(&JobRow::from(job), format);
            output::print_success(&format!("Job {id} cancelled"));
        }),
    };

    db.close().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lexalert_entity::job::CreateJob;

    #[test]
    fn test_job_row_formats_attempts_and_error() {
        let mut job = CreateJob::new("alert_reminder", "reminders", serde_json::json!({}), 5)
            .into_job(Utc::now());
        job.attempts = 2;
        job.error_message = Some("provider unavailable".into());

        let row = JobRow::from(job);
        assert_eq!(row.attempts, "2/5");
        assert_eq!(row.status, "pending");
        assert_eq!(row.error, "provider unavailable");
    }
}
