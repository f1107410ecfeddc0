use async_trait::async_trait;
use campus_application::AuthorizationRepository;
use campus_core::{AppError, AppResult};
use campus_domain::{PermissionCode, RoleId, UserId, UserRoleAssignment};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed repository for role assignment and grant lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: Uuid,
    role_id: Uuid,
    assigned_at: DateTime<Utc>,
    assigned_by: Option<Uuid>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
}

impl From<AssignmentRow> for UserRoleAssignment {
    fn from(row: AssignmentRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            role_id: RoleId::from_uuid(row.role_id),
            assigned_at: row.assigned_at,
            assigned_by: row.assigned_by.map(UserId::from_uuid),
            expires_at: row.expires_at,
            is_active: row.is_active,
        }
    }
}

#[derive(Debug, FromRow)]
struct PermissionCodeRow {
    code: String,
}

fn decode_codes(rows: Vec<PermissionCodeRow>) -> AppResult<Vec<PermissionCode>> {
    rows.into_iter()
        .map(|row| {
            PermissionCode::new(row.code.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "failed to decode permission code '{}': {error}",
                    row.code
                ))
            })
        })
        .collect()
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_effective_assignments(
        &self,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<UserRoleAssignment>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT user_id, role_id, assigned_at, assigned_by, expires_at, is_active
            FROM user_role_assignments
            WHERE user_id = $1
                AND is_active
                AND (expires_at IS NULL OR expires_at > $2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load role assignments for user '{user_id}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(UserRoleAssignment::from).collect())
    }

    async fn list_permission_codes_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<PermissionCode>> {
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let role_ids = role_ids.iter().map(RoleId::as_uuid).collect::<Vec<_>>();
        let rows = sqlx::query_as::<_, PermissionCodeRow>(
            r#"
            SELECT DISTINCT permissions.code
            FROM role_permissions
            INNER JOIN permissions
                ON permissions.id = role_permissions.permission_id
            WHERE role_permissions.role_id = ANY($1)
            "#,
        )
        .bind(role_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role permissions: {error}")))?;

        decode_codes(rows)
    }

    async fn list_permission_codes(&self) -> AppResult<Vec<PermissionCode>> {
        let rows = sqlx::query_as::<_, PermissionCodeRow>(
            r#"
            SELECT code
            FROM permissions
            ORDER BY code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load permission catalog: {error}"))
        })?;

        decode_codes(rows)
    }
}

#[cfg(test)]
mod tests;
