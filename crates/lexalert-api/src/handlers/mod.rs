//! HTTP request handlers.

pub mod admin;
pub mod alerts;
pub mod health;
