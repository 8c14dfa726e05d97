//! PostgreSQL implementations of the store traits.

pub mod alert;
pub mod job;
pub mod user;

pub use alert::AlertRepository;
pub use job::JobRepository;
pub use user::UserRepository;

use lexalert_core::error::{AppError, ErrorKind};

/// Map a sqlx error into an [`AppError`], surfacing unique violations as
/// conflicts.
pub(crate) fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let unique_violation = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique_violation {
            AppError::with_source(ErrorKind::Conflict, message, e)
        } else {
            AppError::with_source(ErrorKind::Database, message, e)
        }
    }
}
