use std::sync::Arc;

use campus_application::PermissionSetCache;
use campus_core::{AppError, AppResult};
use campus_infrastructure::{InMemoryPermissionSetCache, RedisPermissionSetCache};

use crate::api_config::{ApiConfig, PermissionCacheBackend};

pub(super) fn build_permission_set_cache(
    config: &ApiConfig,
    redis_client: Option<redis::Client>,
) -> AppResult<Option<Arc<dyn PermissionSetCache>>> {
    if config.permission_cache_ttl_seconds == 0 {
        return Ok(None);
    }

    match config.permission_cache_backend {
        PermissionCacheBackend::None => Ok(None),
        PermissionCacheBackend::InMemory => Ok(Some(Arc::new(InMemoryPermissionSetCache::new()))),
        PermissionCacheBackend::Redis => {
            let redis_client = redis_client.ok_or_else(|| {
                AppError::Validation(
                    "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
                )
            })?;
            Ok(Some(Arc::new(RedisPermissionSetCache::new(
                redis_client,
                "campus:permission_set",
                config.permission_cache_ttl_seconds,
            ))))
        }
    }
}
