//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::UserRole;
use super::status::UserStatus;

/// A LexAlert user. Alerts reference users by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Email address reminders are sent to.
    pub email: String,
    /// Display name.
    pub name: String,
    /// User role.
    pub role: UserRole,
    /// Account status.
    pub status: UserStatus,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Check if this user has admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Project the contact fields used for notifications.
    pub fn contact(&self) -> UserContact {
        UserContact {
            user_id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Where to deliver a notification for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserContact {
    /// The user.
    pub user_id: Uuid,
    /// Recipient address.
    pub email: String,
    /// Recipient display name.
    pub name: String,
}
