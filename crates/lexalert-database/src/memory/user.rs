//! In-memory user directory.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use lexalert_core::result::AppResult;
use lexalert_entity::user::{User, UserContact};

use crate::traits::UserDirectory;

/// [`UserDirectory`] over a concurrent map.
#[derive(Debug, Clone, Default)]
pub struct MemoryUserDirectory {
    users: Arc<DashMap<Uuid, User>>,
}

impl MemoryUserDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    pub fn insert(&self, user: User) {
        self.users.insert(user.id, user);
    }

    /// Remove a user entirely.
    pub fn remove(&self, user_id: Uuid) {
        self.users.remove(&user_id);
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<UserContact>> {
        Ok(self
            .users
            .get(&user_id)
            .filter(|user| user.deleted_at.is_none())
            .map(|user| user.contact()))
    }
}
