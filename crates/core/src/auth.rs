use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User information persisted in the authenticated session.
///
/// The session is issued by an external identity provider. `permissions` is
/// whatever that provider embedded at issuance time and is deliberately kept
/// untyped; consumers must validate its shape before trusting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: Option<String>,
    issued_at: DateTime<Utc>,
    #[serde(default)]
    permissions: Option<serde_json::Value>,
}

impl UserIdentity {
    /// Creates a user identity without an embedded permission claim.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: Option<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email,
            issued_at,
            permissions: None,
        }
    }

    /// Attaches the raw permission claim captured at session issuance.
    #[must_use]
    pub fn with_permissions_claim(mut self, permissions: serde_json::Value) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns when the session carrying this identity was issued.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Returns the raw, unvalidated permission claim.
    #[must_use]
    pub fn permissions_claim(&self) -> Option<&serde_json::Value> {
        self.permissions.as_ref()
    }
}
