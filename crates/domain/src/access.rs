//! Access decision outcomes.

use serde::{Deserialize, Serialize};

/// Generic message returned to API clients on every denial.
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied - insufficient permissions";

/// Request category selecting how a denial is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// JSON endpoints under `/api`.
    Api,
    /// Interactive pages.
    Page,
}

impl RequestClass {
    /// Classifies a request path.
    #[must_use]
    pub fn classify(path: &str) -> Self {
        if path == "/api" || path.starts_with("/api/") {
            Self::Api
        } else {
            Self::Page
        }
    }

    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::Page => "page",
        }
    }
}

/// Policy applied to authenticated requests that match no registry entry.
///
/// Only the observed behavior exists today. The enum keeps the choice
/// visible at the call site until the intended default is confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UndeclaredRoutePolicy {
    /// Any authenticated subject may use an undeclared route.
    #[default]
    AllowAuthenticated,
}

/// Reason a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// No or invalid subject on the request.
    Unauthenticated,
    /// Effective permissions do not intersect the required list.
    PermissionDenied,
    /// The permission store could not be read.
    ResolverUnavailable,
}

impl DenialKind {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission_denied",
            Self::ResolverUnavailable => "resolver_unavailable",
        }
    }
}

/// JSON body sent to API clients on denial. Never lists permission codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenialBody {
    /// Always `false`.
    pub success: bool,
    /// Generic error message.
    pub error: String,
}

impl Default for DenialBody {
    fn default() -> Self {
        Self {
            success: false,
            error: ACCESS_DENIED_MESSAGE.to_owned(),
        }
    }
}

/// How a denial is delivered to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialResponse {
    /// JSON error with an HTTP status (API class).
    Status {
        /// 401 or 403.
        http_status: u16,
        /// Generic error payload.
        body: DenialBody,
    },
    /// Silent redirect (page class).
    Redirect {
        /// Target location.
        redirect_to: String,
    },
}

/// Terminal outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed.
    Allow,
    /// Request is rejected.
    Deny {
        /// Why the request was rejected.
        kind: DenialKind,
        /// How the rejection is delivered.
        response: DenialResponse,
    },
}

impl Decision {
    /// Builds a denial for the given request class.
    ///
    /// API requests get 401 for [`DenialKind::Unauthenticated`] and 403
    /// otherwise; page requests are redirected to `redirect_to`.
    #[must_use]
    pub fn deny(kind: DenialKind, class: RequestClass, redirect_to: impl Into<String>) -> Self {
        let response = match class {
            RequestClass::Api => DenialResponse::Status {
                http_status: match kind {
                    DenialKind::Unauthenticated => 401,
                    DenialKind::PermissionDenied | DenialKind::ResolverUnavailable => 403,
                },
                body: DenialBody::default(),
            },
            RequestClass::Page => DenialResponse::Redirect {
                redirect_to: redirect_to.into(),
            },
        };

        Self::Deny { kind, response }
    }

    /// Returns whether the request may proceed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns the denial kind, if denied.
    #[must_use]
    pub fn denial_kind(&self) -> Option<DenialKind> {
        match self {
            Self::Allow => None,
            Self::Deny { kind, .. } => Some(*kind),
        }
    }

    /// Returns the HTTP status of an API denial.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Deny {
                response: DenialResponse::Status { http_status, .. },
                ..
            } => Some(*http_status),
            _ => None,
        }
    }

    /// Returns the redirect target of a page denial.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Deny {
                response: DenialResponse::Redirect { redirect_to },
                ..
            } => Some(redirect_to.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ACCESS_DENIED_MESSAGE, Decision, DenialBody, DenialKind, RequestClass};

    #[test]
    fn api_prefix_selects_api_class() {
        assert_eq!(RequestClass::classify("/api/hr/employees"), RequestClass::Api);
        assert_eq!(RequestClass::classify("/api"), RequestClass::Api);
        assert_eq!(RequestClass::classify("/apiary"), RequestClass::Page);
        assert_eq!(RequestClass::classify("/hr/dashboard"), RequestClass::Page);
    }

    #[test]
    fn api_denials_use_status_codes() {
        let unauthenticated = Decision::deny(DenialKind::Unauthenticated, RequestClass::Api, "/login");
        assert_eq!(unauthenticated.http_status(), Some(401));
        assert_eq!(unauthenticated.redirect_target(), None);

        let forbidden = Decision::deny(DenialKind::PermissionDenied, RequestClass::Api, "/unauthorized");
        assert_eq!(forbidden.http_status(), Some(403));

        let unavailable =
            Decision::deny(DenialKind::ResolverUnavailable, RequestClass::Api, "/unauthorized");
        assert_eq!(unavailable.http_status(), Some(403));
        assert_eq!(
            unavailable.denial_kind().map(|kind| kind.as_str()),
            Some("resolver_unavailable")
        );
    }

    #[test]
    fn page_denials_redirect() {
        let decision = Decision::deny(DenialKind::PermissionDenied, RequestClass::Page, "/unauthorized");
        assert_eq!(decision.redirect_target(), Some("/unauthorized"));
        assert_eq!(decision.http_status(), None);
        assert!(!decision.is_allowed());
    }

    #[test]
    fn denial_body_is_generic() {
        let body = serde_json::to_value(DenialBody::default());
        assert!(body.is_ok_and(|body| body
            == serde_json::json!({"success": false, "error": ACCESS_DENIED_MESSAGE})));
    }
}
