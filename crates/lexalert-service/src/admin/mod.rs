//! Administrative operations.

pub mod jobs;

pub use jobs::JobAdminService;
