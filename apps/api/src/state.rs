use campus_application::AccessDecisionEngine;
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub access_engine: AccessDecisionEngine,
    pub postgres_pool: PgPool,
    pub redis_client: Option<redis::Client>,
    pub redis_required: bool,
}
