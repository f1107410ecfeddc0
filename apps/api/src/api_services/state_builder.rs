use std::sync::Arc;

use campus_application::{AccessDecisionEngine, PermissionResolver, RedirectTargets};
use campus_core::AppError;
use campus_infrastructure::{
    BufferedDecisionAuditSink, PostgresAccessChangeListener, PostgresAuthorizationRepository,
    PostgresDecisionLogRepository, build_route_registry,
};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, PermissionCacheBackend};
use crate::state::AppState;

use super::redis::build_redis_client;

mod caches;

/// Wires the access decision engine and its collaborators.
///
/// Fails with [`AppError::Misconfigured`] when the route catalog cannot be
/// loaded or contains ambiguous entries.
pub async fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let redis_client = config
        .redis_url
        .as_deref()
        .map(build_redis_client)
        .transpose()?;

    let registry = Arc::new(build_route_registry(config.route_catalog_path.as_deref()).await?);

    let authorization_repository = Arc::new(PostgresAuthorizationRepository::new(pool.clone()));
    let mut resolver = PermissionResolver::new(authorization_repository);
    if let Some(cache) = caches::build_permission_set_cache(config, redis_client.clone())? {
        resolver = resolver.with_cache(cache, config.permission_cache_ttl_seconds);
    }

    match resolver.unknown_registry_codes(&registry).await {
        Ok(unknown) if unknown.is_empty() => {}
        Ok(unknown) => warn!(
            codes = ?unknown.iter().map(|code| code.as_str()).collect::<Vec<_>>(),
            "route catalog references permission codes missing from the store"
        ),
        Err(error) => warn!(%error, "skipping route catalog consistency check"),
    }

    let decision_log_repository = Arc::new(PostgresDecisionLogRepository::new(pool.clone()));
    let (audit_sink, _audit_writer) =
        BufferedDecisionAuditSink::spawn(decision_log_repository, config.audit_buffer_capacity);

    if config.access_change_listener {
        let _listener = PostgresAccessChangeListener::new(pool.clone(), resolver.clone()).spawn();
        info!("listening for access control changes");
    }

    let access_engine = AccessDecisionEngine::new(registry, resolver, Arc::new(audit_sink))
        .with_permission_source(config.permission_source)
        .with_redirect_targets(RedirectTargets {
            login_path: config.login_path.clone(),
            denied_path: config.access_denied_redirect.clone(),
        });

    Ok(AppState {
        access_engine,
        postgres_pool: pool,
        redis_client,
        redis_required: config.permission_cache_backend == PermissionCacheBackend::Redis,
    })
}
