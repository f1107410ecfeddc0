use axum::Json;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use campus_application::AccessRequest;
use campus_core::UserIdentity;
use campus_domain::{Decision, DenialResponse, RouteMethod};
use tower_sessions::Session;
use tracing::warn;

use crate::dto::AccessDeniedResponse;
use crate::state::AppState;

/// Session key holding the authenticated [`UserIdentity`].
pub const SESSION_USER_KEY: &str = "user_identity";

/// Reads the session identity. An unreadable identity counts as no identity.
pub async fn session_identity(session: &Session) -> Option<UserIdentity> {
    match session.get::<UserIdentity>(SESSION_USER_KEY).await {
        Ok(identity) => identity,
        Err(error) => {
            warn!(%error, "ignoring unreadable session identity");
            None
        }
    }
}

/// Runs every request through the access decision engine.
///
/// Allowed requests continue with the session identity in the request
/// extensions. Denials never reach the handler.
pub async fn enforce_access(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(method) = route_method(request.method()) else {
        return next.run(request).await;
    };

    let identity = session_identity(&session).await;
    let access_request =
        AccessRequest::classified(method, request.uri().path(), identity.clone());

    match state.access_engine.decide(&access_request).await {
        Decision::Allow => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Decision::Deny { response, .. } => denial_response(response),
    }
}

fn denial_response(response: DenialResponse) -> Response {
    match response {
        DenialResponse::Status { http_status, body } => {
            let status = StatusCode::from_u16(http_status).unwrap_or(StatusCode::FORBIDDEN);
            (status, Json(AccessDeniedResponse::from(body))).into_response()
        }
        DenialResponse::Redirect { redirect_to } => Redirect::to(&redirect_to).into_response(),
    }
}

/// Maps an HTTP method onto the registry's method set.
///
/// `HEAD` is checked as `GET`. Preflight and other methods the registry
/// cannot express pass through.
fn route_method(method: &Method) -> Option<RouteMethod> {
    match *method {
        Method::GET | Method::HEAD => Some(RouteMethod::Get),
        Method::POST => Some(RouteMethod::Post),
        Method::PUT => Some(RouteMethod::Put),
        Method::PATCH => Some(RouteMethod::Patch),
        Method::DELETE => Some(RouteMethod::Delete),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode, header};
    use campus_domain::{DenialBody, DenialResponse, RouteMethod};

    use super::{denial_response, route_method};

    #[test]
    fn head_is_checked_as_get() {
        assert_eq!(route_method(&Method::HEAD), Some(RouteMethod::Get));
        assert_eq!(route_method(&Method::OPTIONS), None);
    }

    #[test]
    fn page_denials_become_see_other_redirects() {
        let response = denial_response(DenialResponse::Redirect {
            redirect_to: "/unauthorized".to_owned(),
        });

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok()),
            Some("/unauthorized")
        );
    }

    #[test]
    fn api_denials_keep_their_status() {
        let response = denial_response(DenialResponse::Status {
            http_status: 401,
            body: DenialBody::default(),
        });
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
