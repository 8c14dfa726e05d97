//! # lexalert-api
//!
//! HTTP API layer for LexAlert built on Axum.
//!
//! Provides the REST endpoints for alerts and job administration, bearer
//! token verification, middleware (logging, CORS, compression), extractors,
//! DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, serve};
pub use jwt::{Claims, JwtVerifier};
pub use state::AppState;
