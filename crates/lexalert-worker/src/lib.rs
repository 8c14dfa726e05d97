//! Background job processing and reminder delivery for LexAlert.
//!
//! This crate provides:
//! - A durable job queue with leases, retry backoff and dead-lettering
//! - The reminder scheduler that turns alert due dates into queued jobs
//! - A worker runner that polls for and executes queued jobs
//! - A cron scheduler for reconciliation and cleanup sweeps
//! - Notifiers that deliver reminder emails

pub mod executor;
pub mod jobs;
pub mod notifier;
pub mod queue;
pub mod reminder;
pub mod retry;
pub mod runner;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use queue::{JobCreateParams, JobQueue, QueueStats, RetryOutcome};
pub use reminder::ReminderScheduler;
pub use retry::RetryPolicy;
pub use runner::{JobOutcome, WorkerRunner};
pub use scheduler::CronScheduler;
