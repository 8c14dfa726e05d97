//! Background job domain entities.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{CreateJob, Job, JobStats};
pub use payload::{
    CleanupPayload, ReconcilePayload, ReminderPayload, job_types, queues, reminder_dedup_key,
};
pub use status::JobStatus;
