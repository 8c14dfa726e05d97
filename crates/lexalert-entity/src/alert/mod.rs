//! Alert domain entities.

pub mod category;
pub mod model;
pub mod priority;
pub mod status;

pub use category::AlertCategory;
pub use model::{Alert, AlertFilter, CreateAlert, UpdateAlert};
pub use priority::AlertPriority;
pub use status::{AlertStatus, AlertTransition};
