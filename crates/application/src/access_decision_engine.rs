mod claims;

use std::sync::Arc;

use campus_core::{AppError, AppResult, UserIdentity};
use campus_domain::{
    Decision, DenialKind, EffectivePermissions, PermissionCode, RequestClass, RequiredPermissions,
    RouteMethod, RoutePermissionRegistry, UndeclaredRoutePolicy, UserId,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::{DecisionAuditSink, DecisionEvent, DecisionOutcome, PermissionResolver};

pub use claims::{
    DEFAULT_SESSION_CLAIM_MAX_AGE_SECONDS, PermissionSource, claim_is_fresh,
    parse_permission_claim,
};

/// Redirect targets used for page-class denials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    /// Destination for unauthenticated page requests.
    pub login_path: String,
    /// Destination for denied page requests.
    pub denied_path: String,
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self {
            login_path: "/login".to_owned(),
            denied_path: "/unauthorized".to_owned(),
        }
    }
}

impl RedirectTargets {
    fn login_redirect(&self, requested_path: &str) -> String {
        let next: String = url::form_urlencoded::byte_serialize(requested_path.as_bytes()).collect();
        let separator = if self.login_path.contains('?') { '&' } else { '?' };
        format!("{}{separator}next={next}", self.login_path)
    }
}

/// One request submitted for an access decision.
#[derive(Debug, Clone)]
pub struct AccessRequest {
    /// Request class.
    pub class: RequestClass,
    /// Request method.
    pub method: RouteMethod,
    /// Concrete request path.
    pub path: String,
    /// Session identity, if any.
    pub subject: Option<UserIdentity>,
}

impl AccessRequest {
    /// Creates a request whose class is derived from its path.
    #[must_use]
    pub fn classified(
        method: RouteMethod,
        path: impl Into<String>,
        subject: Option<UserIdentity>,
    ) -> Self {
        let path = path.into();
        Self {
            class: RequestClass::classify(&path),
            method,
            path,
            subject,
        }
    }
}

/// Result of one capability probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityCheck {
    /// Probed method.
    pub method: RouteMethod,
    /// Probed path.
    pub path: String,
    /// Whether the subject would be allowed.
    pub allowed: bool,
}

/// Combines the route registry and the permission resolver into decisions.
#[derive(Clone)]
pub struct AccessDecisionEngine {
    registry: Arc<RoutePermissionRegistry>,
    resolver: PermissionResolver,
    audit_sink: Arc<dyn DecisionAuditSink>,
    source: PermissionSource,
    targets: RedirectTargets,
    undeclared_policy: UndeclaredRoutePolicy,
}

impl AccessDecisionEngine {
    /// Creates an engine resolving permissions live with default redirects.
    #[must_use]
    pub fn new(
        registry: Arc<RoutePermissionRegistry>,
        resolver: PermissionResolver,
        audit_sink: Arc<dyn DecisionAuditSink>,
    ) -> Self {
        Self {
            registry,
            resolver,
            audit_sink,
            source: PermissionSource::Live,
            targets: RedirectTargets::default(),
            undeclared_policy: UndeclaredRoutePolicy::default(),
        }
    }

    /// Selects where effective permissions come from.
    #[must_use]
    pub fn with_permission_source(mut self, source: PermissionSource) -> Self {
        self.source = source;
        self
    }

    /// Overrides page-class redirect targets.
    #[must_use]
    pub fn with_redirect_targets(mut self, targets: RedirectTargets) -> Self {
        self.targets = targets;
        self
    }

    /// Returns the registry backing this engine.
    #[must_use]
    pub fn registry(&self) -> &RoutePermissionRegistry {
        &self.registry
    }

    /// Returns the resolver backing this engine.
    #[must_use]
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Decides one request now.
    pub async fn decide(&self, request: &AccessRequest) -> Decision {
        self.decide_at(request, Utc::now()).await
    }

    /// Decides one request at `as_of` and records the decision event.
    pub async fn decide_at(&self, request: &AccessRequest, as_of: DateTime<Utc>) -> Decision {
        let required = self.registry.lookup(request.method, &request.path);
        let decision = self.evaluate(request, required, as_of).await;

        self.audit_sink.record(DecisionEvent {
            subject: request
                .subject
                .as_ref()
                .map(|identity| identity.subject().to_owned()),
            class: request.class,
            method: request.method,
            path: request.path.clone(),
            required_permissions: required
                .map(|required| required.codes().to_vec())
                .unwrap_or_default(),
            outcome: DecisionOutcome::from(&decision),
            occurred_at: as_of,
        });

        decision
    }

    /// Returns the effective permissions the engine would use for `identity`.
    pub async fn effective_permissions(
        &self,
        identity: &UserIdentity,
    ) -> AppResult<EffectivePermissions> {
        let user_id = parse_subject(identity)?;
        self.permissions_for(identity, user_id, Utc::now()).await
    }

    /// Probes whether `identity` may use each route, without recording events.
    pub async fn check(
        &self,
        identity: &UserIdentity,
        probes: &[(RouteMethod, String)],
    ) -> AppResult<Vec<CapabilityCheck>> {
        let effective = self.effective_permissions(identity).await?;

        Ok(probes
            .iter()
            .map(|(method, path)| CapabilityCheck {
                method: *method,
                path: path.clone(),
                allowed: self
                    .registry
                    .lookup(*method, path)
                    .is_none_or(|required| effective.intersects(required)),
            })
            .collect())
    }

    async fn evaluate(
        &self,
        request: &AccessRequest,
        required: Option<&RequiredPermissions>,
        as_of: DateTime<Utc>,
    ) -> Decision {
        let Some(identity) = &request.subject else {
            return self.deny(DenialKind::Unauthenticated, request);
        };

        let user_id = match parse_subject(identity) {
            Ok(user_id) => user_id,
            Err(error) => {
                warn!(subject = identity.subject(), %error, "rejecting session subject");
                return self.deny(DenialKind::Unauthenticated, request);
            }
        };

        let Some(required) = required else {
            return match self.undeclared_policy {
                UndeclaredRoutePolicy::AllowAuthenticated => {
                    debug!(
                        method = %request.method,
                        path = %request.path,
                        %user_id,
                        "allowing authenticated request to undeclared route"
                    );
                    Decision::Allow
                }
            };
        };

        let effective = match self.permissions_for(identity, user_id, as_of).await {
            Ok(effective) => effective,
            Err(error) => {
                error!(
                    method = %request.method,
                    path = %request.path,
                    %user_id,
                    %error,
                    "permission resolution failed, denying request"
                );
                return self.deny(DenialKind::ResolverUnavailable, request);
            }
        };

        if effective.intersects(required) {
            return Decision::Allow;
        }

        info!(
            method = %request.method,
            path = %request.path,
            %user_id,
            required = ?required.codes().iter().map(PermissionCode::as_str).collect::<Vec<_>>(),
            "access denied"
        );
        self.deny(DenialKind::PermissionDenied, request)
    }

    async fn permissions_for(
        &self,
        identity: &UserIdentity,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> AppResult<EffectivePermissions> {
        match self.source {
            PermissionSource::Live => self.resolver.resolve(user_id, as_of).await,
            PermissionSource::SessionClaim { max_age } => {
                if !claim_is_fresh(identity, max_age, as_of) {
                    return self.resolver.resolve(user_id, as_of).await;
                }

                Ok(
                    parse_permission_claim(identity.permissions_claim()).unwrap_or_else(|error| {
                        warn!(%user_id, %error, "ignoring malformed session permission claim");
                        EffectivePermissions::empty()
                    }),
                )
            }
        }
    }

    fn deny(&self, kind: DenialKind, request: &AccessRequest) -> Decision {
        let redirect_to = match kind {
            DenialKind::Unauthenticated => self.targets.login_redirect(&request.path),
            DenialKind::PermissionDenied | DenialKind::ResolverUnavailable => {
                self.targets.denied_path.clone()
            }
        };

        Decision::deny(kind, request.class, redirect_to)
    }
}

fn parse_subject(identity: &UserIdentity) -> AppResult<UserId> {
    identity.subject().parse::<UserId>().map_err(|error| {
        AppError::Unauthorized(format!(
            "session subject '{}' is not a user id: {error}",
            identity.subject()
        ))
    })
}
