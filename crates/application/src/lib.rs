//! Application services and ports.

#![forbid(unsafe_code)]

mod access_decision_engine;
mod access_ports;
mod permission_resolver;

pub use access_decision_engine::{
    AccessDecisionEngine, AccessRequest, CapabilityCheck, DEFAULT_SESSION_CLAIM_MAX_AGE_SECONDS,
    PermissionSource, RedirectTargets, claim_is_fresh, parse_permission_claim,
};
pub use access_ports::{
    AccessChange, AuthorizationRepository, CachedPermissionSet, DecisionAuditSink, DecisionEvent,
    DecisionLogRepository, DecisionOutcome, NoopDecisionAuditSink, PermissionSetCache,
};
pub use permission_resolver::{DEFAULT_PERMISSION_CACHE_TTL_SECONDS, PermissionResolver};
