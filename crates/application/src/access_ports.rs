mod audit;
mod cache;
mod change;
mod repository;

pub use audit::{
    DecisionAuditSink, DecisionEvent, DecisionLogRepository, DecisionOutcome,
    NoopDecisionAuditSink,
};
pub use cache::{CachedPermissionSet, PermissionSetCache};
pub use change::AccessChange;
pub use repository::AuthorizationRepository;
