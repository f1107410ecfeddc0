use campus_core::AppError;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Unavailable(format!("failed to connect to database: {error}")))?;

    let migrator = sqlx::migrate!("../../crates/infrastructure/migrations");
    migrator
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;
    info!(migrations = migrator.iter().count(), "access control schema is current");

    Ok(pool)
}
