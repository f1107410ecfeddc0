use campus_core::{AppError, AppResult, UserIdentity};
use campus_domain::{EffectivePermissions, PermissionCode};
use chrono::{DateTime, Duration, Utc};

/// Default bound on how old a session permission claim may be when trusted.
pub const DEFAULT_SESSION_CLAIM_MAX_AGE_SECONDS: u32 = 900;

/// Where the decision engine obtains a subject's effective permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionSource {
    /// Resolve from the store on every decision.
    Live,
    /// Trust the permission list embedded at session issuance while the
    /// session is younger than `max_age`; older sessions resolve live.
    SessionClaim {
        /// Staleness bound for the embedded list.
        max_age: Duration,
    },
}

impl PermissionSource {
    /// Creates a claim source with the given staleness bound.
    #[must_use]
    pub fn session_claim(max_age_seconds: u32) -> Self {
        Self::SessionClaim {
            max_age: Duration::seconds(i64::from(max_age_seconds)),
        }
    }
}

/// Returns whether the identity's claim is young enough to trust at `as_of`.
#[must_use]
pub fn claim_is_fresh(identity: &UserIdentity, max_age: Duration, as_of: DateTime<Utc>) -> bool {
    let age = as_of - identity.issued_at();
    age >= Duration::zero() && age <= max_age
}

/// Validates the untyped session permission claim.
///
/// The claim must be a JSON array of valid permission code strings.
pub fn parse_permission_claim(claim: Option<&serde_json::Value>) -> AppResult<EffectivePermissions> {
    let Some(claim) = claim else {
        return Err(AppError::Validation(
            "session carries no permission claim".to_owned(),
        ));
    };

    let serde_json::Value::Array(values) = claim else {
        return Err(AppError::Validation(
            "session permission claim must be an array".to_owned(),
        ));
    };

    values
        .iter()
        .map(|value| match value {
            serde_json::Value::String(code) => PermissionCode::new(code.as_str()),
            other => Err(AppError::Validation(format!(
                "session permission claim entry must be a string, got '{other}'"
            ))),
        })
        .collect()
}
