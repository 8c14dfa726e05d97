//! In-memory store implementations.
//!
//! Used by the test suites and by single-process deployments that do not
//! need durability. Conditional updates hold the entry (or queue) lock for
//! the whole check-and-set so they keep the same race semantics as the
//! PostgreSQL repositories.

pub mod alert;
pub mod job;
pub mod user;

pub use alert::MemoryAlertStore;
pub use job::MemoryJobStore;
pub use user::MemoryUserDirectory;
