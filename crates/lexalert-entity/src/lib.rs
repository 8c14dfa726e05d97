//! # lexalert-entity
//!
//! Domain entity models for LexAlert. Every struct in this crate
//! represents a database table row or a domain value object. Database
//! entities derive `sqlx::FromRow`; enums map onto PostgreSQL enum types.

pub mod alert;
pub mod job;
pub mod user;
