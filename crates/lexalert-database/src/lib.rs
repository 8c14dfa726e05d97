//! # lexalert-database
//!
//! Persistence for LexAlert: the store traits the rest of the workspace
//! depends on, their PostgreSQL implementations, and in-memory
//! implementations used by tests and single-process deployments.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod traits;

pub use connection::DatabasePool;
pub use traits::{AlertStore, JobStore, UserDirectory};
