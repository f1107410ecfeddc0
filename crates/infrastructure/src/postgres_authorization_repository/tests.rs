use campus_application::AuthorizationRepository;
use campus_domain::{RoleId, UserId};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresAuthorizationRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres authorization tests: {error}");
    }

    Some(pool)
}

async fn insert_role(pool: &PgPool, codes: &[String]) -> RoleId {
    let role_id = RoleId::new();
    let role_insert = sqlx::query("INSERT INTO roles (id, code, name) VALUES ($1, $2, $3)")
        .bind(role_id.as_uuid())
        .bind(format!("role-{}", role_id.as_uuid()))
        .bind("Test Role")
        .execute(pool)
        .await;
    assert!(role_insert.is_ok());

    for code in codes {
        let permission_insert = sqlx::query(
            r#"
            INSERT INTO permissions (id, code, name)
            VALUES ($1, $2, $2)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .execute(pool)
        .await;
        assert!(permission_insert.is_ok());

        let grant_insert = sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            SELECT $1, id FROM permissions WHERE code = $2
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(code)
        .execute(pool)
        .await;
        assert!(grant_insert.is_ok());
    }

    role_id
}

async fn assign(
    pool: &PgPool,
    user_id: UserId,
    role_id: RoleId,
    expires_in: Option<Duration>,
    is_active: bool,
) {
    let insert = sqlx::query(
        r#"
        INSERT INTO user_role_assignments (user_id, role_id, expires_at, is_active)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id.as_uuid())
    .bind(role_id.as_uuid())
    .bind(expires_in.map(|duration| Utc::now() + duration))
    .bind(is_active)
    .execute(pool)
    .await;
    assert!(insert.is_ok());
}

#[tokio::test]
async fn effective_assignments_skip_expired_and_inactive_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAuthorizationRepository::new(pool.clone());
    let suffix = Uuid::new_v4().simple().to_string();
    let live = insert_role(&pool, &[format!("test.{suffix}.live")]).await;
    let expired = insert_role(&pool, &[format!("test.{suffix}.expired")]).await;
    let revoked = insert_role(&pool, &[format!("test.{suffix}.revoked")]).await;
    let user_id = UserId::new();
    assign(&pool, user_id, live, Some(Duration::hours(1)), true).await;
    assign(&pool, user_id, expired, Some(Duration::hours(-1)), true).await;
    assign(&pool, user_id, revoked, None, false).await;

    let assignments = repository
        .list_effective_assignments(user_id, Utc::now())
        .await;
    assert!(assignments.is_ok_and(|assignments| {
        assignments.len() == 1 && assignments.iter().all(|value| value.role_id == live)
    }));
}

#[tokio::test]
async fn role_codes_are_distinct_across_roles() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresAuthorizationRepository::new(pool.clone());
    let shared = format!("test.{}.shared", Uuid::new_v4().simple());
    let first = insert_role(&pool, std::slice::from_ref(&shared)).await;
    let second = insert_role(&pool, std::slice::from_ref(&shared)).await;

    let codes = repository
        .list_permission_codes_for_roles(&[first, second])
        .await;
    assert!(codes.is_ok_and(|codes| codes.len() == 1));

    let catalog = repository.list_permission_codes().await;
    assert!(catalog.is_ok_and(|catalog| catalog.iter().any(|code| code.as_str() == shared)));
}
