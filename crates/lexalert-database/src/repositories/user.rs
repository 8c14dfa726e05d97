//! User repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use lexalert_core::result::AppResult;
use lexalert_entity::user::UserContact;

use super::db_error;
use crate::traits::UserDirectory;

/// PostgreSQL-backed user lookups.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<UserContact>> {
        sqlx::query_as::<_, UserContact>(
            "SELECT id AS user_id, email, name FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to resolve user contact"))
    }
}
