use axum::extract::State;
use axum::{Extension, Json};
use campus_core::{AppError, UserIdentity};
use campus_domain::RouteMethod;

use crate::dto::{AccessCheckRequest, AccessCheckResponse, AccessProbeResponse};
use crate::error::ApiResult;
use crate::state::AppState;

/// Upper bound on routes probed in one request.
pub const MAX_ACCESS_PROBES: usize = 100;

/// Reports which of the given routes the caller may use.
pub async fn check_access_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    Json(payload): Json<AccessCheckRequest>,
) -> ApiResult<Json<AccessCheckResponse>> {
    if payload.routes.len() > MAX_ACCESS_PROBES {
        return Err(AppError::Validation(format!(
            "at most {MAX_ACCESS_PROBES} routes can be checked at once"
        ))
        .into());
    }

    let probes = payload
        .routes
        .into_iter()
        .map(|route| {
            let method = route.method.parse::<RouteMethod>()?;
            if method == RouteMethod::Any {
                return Err(AppError::Validation(
                    "probes must name a concrete method".to_owned(),
                ));
            }
            Ok((method, route.path))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let results = state.access_engine.check(&identity, &probes).await?;

    Ok(Json(AccessCheckResponse {
        results: results.into_iter().map(AccessProbeResponse::from).collect(),
    }))
}
