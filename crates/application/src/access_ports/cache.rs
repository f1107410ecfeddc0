use async_trait::async_trait;
use campus_core::AppResult;
use campus_domain::{EffectivePermissions, RoleId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Effective permission set held by a cache together with its validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPermissionSet {
    /// Resolved permission codes.
    pub permissions: EffectivePermissions,
    /// Roles that contributed to the set, for role invalidation.
    pub role_ids: Vec<RoleId>,
    /// Instant the set was resolved for.
    pub resolved_at: DateTime<Utc>,
    /// First instant at which the set must no longer be served.
    pub valid_until: DateTime<Utc>,
}

impl CachedPermissionSet {
    /// Returns whether the entry may answer a resolution at `as_of`.
    #[must_use]
    pub fn covers(&self, as_of: DateTime<Utc>) -> bool {
        self.resolved_at <= as_of && as_of < self.valid_until
    }
}

/// Optional cache port for resolved permission sets.
#[async_trait]
pub trait PermissionSetCache: Send + Sync {
    /// Returns the cached set for one subject.
    async fn get_permission_set(&self, user_id: UserId) -> AppResult<Option<CachedPermissionSet>>;

    /// Stores the set for one subject until its `valid_until`.
    async fn put_permission_set(&self, user_id: UserId, entry: CachedPermissionSet)
    -> AppResult<()>;

    /// Drops the cached set of one subject.
    async fn invalidate_subject(&self, user_id: UserId) -> AppResult<()>;

    /// Drops every cached set the role contributed to.
    async fn invalidate_role(&self, role_id: RoleId) -> AppResult<()>;

    /// Drops every cached set.
    async fn invalidate_all(&self) -> AppResult<()>;
}
