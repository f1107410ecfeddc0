use axum::Json;
use axum::extract::State;
use campus_core::AppError;
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::middleware::session_identity;
use crate::state::AppState;

/// Returns the session identity with its effective permission codes.
pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session_identity(&session)
        .await
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let permissions = state.access_engine.effective_permissions(&identity).await?;

    Ok(Json(UserIdentityResponse::from_identity(
        &identity,
        &permissions,
    )))
}
