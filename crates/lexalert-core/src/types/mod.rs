//! Core type definitions used across the LexAlert workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
