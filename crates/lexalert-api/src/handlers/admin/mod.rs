//! Admin handlers. All routes require the admin role.

pub mod jobs;
pub mod reminders;
