use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use campus_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::{SessionManagerLayer, SessionStore};

use crate::error::ApiError;
use crate::state::AppState;
use crate::{handlers, middleware};

mod cors;

#[cfg(test)]
mod tests;

/// Builds the HTTP router.
///
/// `/health` and `/auth/me` sit outside access enforcement. Every other
/// request, including paths this service does not serve, passes through
/// [`middleware::enforce_access`] first.
pub fn build_router<S>(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<S>,
) -> Result<Router, AppError>
where
    S: SessionStore + Clone,
{
    let enforced_routes = Router::new()
        .route(
            "/api/access/check",
            post(handlers::access::check_access_handler),
        )
        .fallback(not_found_handler)
        .layer(from_fn_with_state(
            app_state.clone(),
            middleware::enforce_access,
        ));

    let cors_layer = cors::build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/me", get(handlers::auth::me_handler))
        .merge(enforced_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}

async fn not_found_handler() -> ApiError {
    AppError::NotFound("route is not served by this service".to_owned()).into()
}
