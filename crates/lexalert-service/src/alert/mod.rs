//! Alert lifecycle management.

pub mod service;

pub use service::{AlertService, CreateAlertRequest, MAX_TITLE_LEN};
