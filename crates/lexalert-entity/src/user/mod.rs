//! User domain entities.

pub mod model;
pub mod role;
pub mod status;

pub use model::{User, UserContact};
pub use role::UserRole;
pub use status::UserStatus;
