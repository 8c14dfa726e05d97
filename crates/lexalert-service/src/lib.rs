//! # lexalert-service
//!
//! Business logic service layer for LexAlert. Services orchestrate the
//! stores and the reminder scheduler to implement application use cases.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references.

pub mod admin;
pub mod alert;
pub mod context;
pub mod wiring;

pub use admin::JobAdminService;
pub use alert::{AlertService, CreateAlertRequest};
pub use context::RequestContext;
pub use wiring::{Services, Stores};
