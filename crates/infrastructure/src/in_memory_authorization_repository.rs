use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use campus_application::AuthorizationRepository;
use campus_core::{AppError, AppResult};
use campus_domain::{
    Permission, PermissionCode, PermissionId, Role, RoleId, RolePermission, UserId,
    UserRoleAssignment,
};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Default)]
struct AuthorizationState {
    permissions: HashMap<PermissionId, Permission>,
    roles: HashMap<RoleId, Role>,
    grants: BTreeSet<RolePermission>,
    assignments: Vec<UserRoleAssignment>,
}

/// In-memory authorization store for local development and tests.
#[derive(Default)]
pub struct InMemoryAuthorizationRepository {
    state: RwLock<AuthorizationState>,
}

impl InMemoryAuthorizationRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a permission definition. Codes must be unique.
    pub async fn insert_permission(&self, permission: Permission) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state
            .permissions
            .values()
            .any(|existing| existing.code() == permission.code())
        {
            return Err(AppError::Conflict(format!(
                "permission '{}' already exists",
                permission.code()
            )));
        }

        state.permissions.insert(permission.id(), permission);
        Ok(())
    }

    /// Adds a role definition. Codes must be unique.
    pub async fn insert_role(&self, role: Role) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state
            .roles
            .values()
            .any(|existing| existing.code() == role.code())
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.code()
            )));
        }

        state.roles.insert(role.id(), role);
        Ok(())
    }

    /// Grants a permission to a role. Re-granting is a no-op.
    pub async fn grant(&self, role_id: RoleId, permission_id: PermissionId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }
        if !state.permissions.contains_key(&permission_id) {
            return Err(AppError::NotFound(format!(
                "permission '{}' does not exist",
                permission_id.as_uuid()
            )));
        }

        state.grants.insert(RolePermission {
            role_id,
            permission_id,
        });
        Ok(())
    }

    /// Removes a grant.
    pub async fn revoke_grant(&self, role_id: RoleId, permission_id: PermissionId) {
        self.state.write().await.grants.remove(&RolePermission {
            role_id,
            permission_id,
        });
    }

    /// Records an assignment, replacing any existing one for the same pair.
    pub async fn assign(&self, assignment: UserRoleAssignment) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&assignment.role_id) {
            return Err(AppError::NotFound(format!(
                "role '{}' does not exist",
                assignment.role_id
            )));
        }

        state.assignments.retain(|existing| {
            existing.user_id != assignment.user_id || existing.role_id != assignment.role_id
        });
        state.assignments.push(assignment);
        Ok(())
    }

    /// Marks an assignment inactive.
    pub async fn deactivate(&self, user_id: UserId, role_id: RoleId) {
        for assignment in self.state.write().await.assignments.iter_mut() {
            if assignment.user_id == user_id && assignment.role_id == role_id {
                assignment.is_active = false;
            }
        }
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAuthorizationRepository {
    async fn list_effective_assignments(
        &self,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        Ok(self
            .state
            .read()
            .await
            .assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_effective_at(as_of))
            .cloned()
            .collect())
    }

    async fn list_permission_codes_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<PermissionCode>> {
        let state = self.state.read().await;
        let codes = state
            .grants
            .iter()
            .filter(|grant| role_ids.contains(&grant.role_id))
            .filter_map(|grant| state.permissions.get(&grant.permission_id))
            .map(|permission| permission.code().clone())
            .collect::<BTreeSet<_>>();

        Ok(codes.into_iter().collect())
    }

    async fn list_permission_codes(&self) -> AppResult<Vec<PermissionCode>> {
        let state = self.state.read().await;
        let codes = state
            .permissions
            .values()
            .map(|permission| permission.code().clone())
            .collect::<BTreeSet<_>>();

        Ok(codes.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use campus_application::AuthorizationRepository;
    use campus_domain::{
        Permission, PermissionCode, PermissionId, Role, RoleId, UserId, UserRoleAssignment,
    };
    use chrono::{Duration, Utc};

    use super::InMemoryAuthorizationRepository;

    async fn seeded() -> (InMemoryAuthorizationRepository, RoleId, PermissionId) {
        let repository = InMemoryAuthorizationRepository::new();
        let role_id = RoleId::new();
        let permission_id = PermissionId::new();

        let Ok(role) = Role::new(role_id, "hr_clerk", "HR Clerk") else {
            panic!("role fixture must be valid");
        };
        let Ok(code) = PermissionCode::new("hr.employees.view") else {
            panic!("permission code fixture must be valid");
        };
        let Ok(permission) = Permission::new(permission_id, code, "View employees") else {
            panic!("permission fixture must be valid");
        };

        assert!(repository.insert_role(role).await.is_ok());
        assert!(repository.insert_permission(permission).await.is_ok());
        assert!(repository.grant(role_id, permission_id).await.is_ok());

        (repository, role_id, permission_id)
    }

    fn assignment(user_id: UserId, role_id: RoleId) -> UserRoleAssignment {
        UserRoleAssignment {
            user_id,
            role_id,
            assigned_at: Utc::now(),
            assigned_by: None,
            expires_at: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn assignments_filter_on_effectiveness() {
        let (repository, role_id, _) = seeded().await;
        let user_id = UserId::new();
        assert!(repository.assign(assignment(user_id, role_id)).await.is_ok());

        let now = Utc::now();
        let live = repository.list_effective_assignments(user_id, now).await;
        assert!(live.is_ok_and(|live| live.len() == 1));

        repository.deactivate(user_id, role_id).await;
        let revoked = repository.list_effective_assignments(user_id, now).await;
        assert!(revoked.is_ok_and(|revoked| revoked.is_empty()));
    }

    #[tokio::test]
    async fn expiring_assignment_drops_out_after_expiry() {
        let (repository, role_id, _) = seeded().await;
        let user_id = UserId::new();
        let expires_at = Utc::now() + Duration::minutes(5);
        let mut value = assignment(user_id, role_id);
        value.expires_at = Some(expires_at);
        assert!(repository.assign(value).await.is_ok());

        let after = repository.list_effective_assignments(user_id, expires_at).await;
        assert!(after.is_ok_and(|after| after.is_empty()));
    }

    #[tokio::test]
    async fn duplicate_codes_and_unknown_roles_are_rejected() {
        let (repository, _, _) = seeded().await;

        let Ok(code) = PermissionCode::new("hr.employees.view") else {
            panic!("permission code fixture must be valid");
        };
        let Ok(duplicate) = Permission::new(PermissionId::new(), code, "Duplicate") else {
            panic!("permission fixture must be valid");
        };
        assert!(repository.insert_permission(duplicate).await.is_err());
        assert!(
            repository
                .assign(assignment(UserId::new(), RoleId::new()))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn revoked_grant_removes_code() {
        let (repository, role_id, permission_id) = seeded().await;
        let before = repository.list_permission_codes_for_roles(&[role_id]).await;
        assert!(before.is_ok_and(|codes| codes.len() == 1));

        repository.revoke_grant(role_id, permission_id).await;
        let after = repository.list_permission_codes_for_roles(&[role_id]).await;
        assert!(after.is_ok_and(|codes| codes.is_empty()));
    }
}
