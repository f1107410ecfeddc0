use async_trait::async_trait;
use campus_application::{DecisionEvent, DecisionLogRepository};
use campus_core::{AppError, AppResult};
use sqlx::PgPool;

/// PostgreSQL-backed append-only access decision log.
#[derive(Clone)]
pub struct PostgresDecisionLogRepository {
    pool: PgPool,
}

impl PostgresDecisionLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DecisionLogRepository for PostgresDecisionLogRepository {
    async fn append_decision(&self, event: DecisionEvent) -> AppResult<()> {
        let required_permissions = event
            .required_permissions
            .iter()
            .map(|code| code.as_str().to_owned())
            .collect::<Vec<_>>();

        sqlx::query(
            r#"
            INSERT INTO access_decision_log (
                subject,
                request_class,
                method,
                path,
                required_permissions,
                outcome,
                occurred_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.subject)
        .bind(event.class.as_str())
        .bind(event.method.as_str())
        .bind(event.path)
        .bind(required_permissions)
        .bind(event.outcome.as_str())
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append decision event: {error}")))?;

        Ok(())
    }
}
