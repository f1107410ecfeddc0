use async_trait::async_trait;
use campus_core::AppResult;
use campus_domain::{PermissionCode, RoleId, UserId, UserRoleAssignment};
use chrono::{DateTime, Utc};

/// Read port over the persisted role/permission model.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists assignments of `user_id` that are active and unexpired at `as_of`.
    async fn list_effective_assignments(
        &self,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<UserRoleAssignment>>;

    /// Lists permission codes granted to any of the given roles.
    async fn list_permission_codes_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<PermissionCode>>;

    /// Lists every permission code known to the store.
    async fn list_permission_codes(&self) -> AppResult<Vec<PermissionCode>>;
}
