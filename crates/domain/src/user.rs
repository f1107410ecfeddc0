//! User identifiers and role assignments.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use campus_core::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RoleId;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid user id '{value}': {error}")))
    }
}

/// Grant of one role to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleAssignment {
    /// User holding the role.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// When the grant was recorded.
    pub assigned_at: DateTime<Utc>,
    /// Administrator who recorded the grant, if known.
    pub assigned_by: Option<UserId>,
    /// Optional passive expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Explicit revocation flag.
    pub is_active: bool,
}

impl UserRoleAssignment {
    /// Returns whether the assignment contributes permissions at `as_of`.
    ///
    /// An assignment counts only while active and strictly before its expiry.
    #[must_use]
    pub fn is_effective_at(&self, as_of: DateTime<Utc>) -> bool {
        self.is_active
            && self
                .expires_at
                .is_none_or(|expires_at| expires_at > as_of)
    }
}
