//! Job handler implementations.

pub mod cleanup;
pub mod reconcile;
pub mod reminder;

pub use cleanup::JobCleanupHandler;
pub use reconcile::{ReconcileJobHandler, ReconcileReport, Reconciler};
pub use reminder::ReminderJobHandler;
