//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod buffered_decision_audit_sink;
mod in_memory_authorization_repository;
mod in_memory_permission_set_cache;
mod postgres_access_change_listener;
mod postgres_authorization_repository;
mod postgres_decision_log_repository;
mod redis_permission_set_cache;
mod route_catalog_loader;

pub use buffered_decision_audit_sink::{BufferedDecisionAuditSink, DEFAULT_AUDIT_BUFFER_CAPACITY};
pub use in_memory_authorization_repository::InMemoryAuthorizationRepository;
pub use in_memory_permission_set_cache::InMemoryPermissionSetCache;
pub use postgres_access_change_listener::{
    ACCESS_CHANGE_CHANNEL, PostgresAccessChangeListener, parse_access_change,
};
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_decision_log_repository::PostgresDecisionLogRepository;
pub use redis_permission_set_cache::RedisPermissionSetCache;
pub use route_catalog_loader::{build_route_registry, load_route_catalog, parse_route_catalog};
