//! Convenience result type alias for LexAlert.

use crate::error::AppError;

/// A specialized `Result` type for LexAlert operations.
pub type AppResult<T> = Result<T, AppError>;
