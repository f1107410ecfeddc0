use std::collections::HashMap;

use async_trait::async_trait;
use campus_application::{CachedPermissionSet, PermissionSetCache};
use campus_core::AppResult;
use campus_domain::{RoleId, UserId};
use chrono::Utc;
use tokio::sync::RwLock;

/// In-memory cache adapter for resolved permission sets.
#[derive(Default)]
pub struct InMemoryPermissionSetCache {
    entries: RwLock<HashMap<UserId, CachedPermissionSet>>,
}

impl InMemoryPermissionSetCache {
    /// Creates an empty in-memory permission set cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionSetCache for InMemoryPermissionSetCache {
    async fn get_permission_set(&self, user_id: UserId) -> AppResult<Option<CachedPermissionSet>> {
        {
            let entries = self.entries.read().await;
            match entries.get(&user_id) {
                Some(entry) if entry.valid_until > Utc::now() => return Ok(Some(entry.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries
            .get(&user_id)
            .is_some_and(|entry| entry.valid_until <= Utc::now())
        {
            entries.remove(&user_id);
        }

        Ok(None)
    }

    async fn put_permission_set(
        &self,
        user_id: UserId,
        entry: CachedPermissionSet,
    ) -> AppResult<()> {
        if entry.valid_until <= Utc::now() {
            return Ok(());
        }

        self.entries.write().await.insert(user_id, entry);
        Ok(())
    }

    async fn invalidate_subject(&self, user_id: UserId) -> AppResult<()> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }

    async fn invalidate_role(&self, role_id: RoleId) -> AppResult<()> {
        self.entries
            .write()
            .await
            .retain(|_, entry| !entry.role_ids.contains(&role_id));
        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
