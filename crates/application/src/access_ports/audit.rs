use async_trait::async_trait;
use campus_core::AppResult;
use campus_domain::{Decision, DenialKind, PermissionCode, RequestClass, RouteMethod};
use chrono::{DateTime, Utc};

/// Outcome recorded for one access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Request allowed.
    Allowed,
    /// Request denied for the given reason.
    Denied(DenialKind),
}

impl DecisionOutcome {
    /// Returns a stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Denied(kind) => kind.as_str(),
        }
    }
}

impl From<&Decision> for DecisionOutcome {
    fn from(value: &Decision) -> Self {
        match value.denial_kind() {
            None => Self::Allowed,
            Some(kind) => Self::Denied(kind),
        }
    }
}

/// Immutable record of one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionEvent {
    /// Subject claim, when present.
    pub subject: Option<String>,
    /// Request class.
    pub class: RequestClass,
    /// Request method.
    pub method: RouteMethod,
    /// Request path.
    pub path: String,
    /// Codes required by the matched entry; empty when undeclared.
    pub required_permissions: Vec<PermissionCode>,
    /// Final outcome.
    pub outcome: DecisionOutcome,
    /// Decision instant.
    pub occurred_at: DateTime<Utc>,
}

/// Port receiving decision events.
///
/// Implementations must not block and must swallow their own failures.
pub trait DecisionAuditSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: DecisionEvent);
}

/// Port for persisting decision events.
#[async_trait]
pub trait DecisionLogRepository: Send + Sync {
    /// Persists one decision event.
    async fn append_decision(&self, event: DecisionEvent) -> AppResult<()>;
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDecisionAuditSink;

impl DecisionAuditSink for NoopDecisionAuditSink {
    fn record(&self, _event: DecisionEvent) {}
}
