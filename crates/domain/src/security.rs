use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use campus_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PERMISSION_CODE_MAX_LENGTH: usize = 128;

/// Opaque permission code such as `hr.employees.view`.
///
/// Codes are compared by exact string equality. The dot structure is a
/// naming convention only; no hierarchy or wildcard is derived from it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Creates a validated permission code.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() {
            return Err(AppError::Validation(
                "permission code must not be empty".to_owned(),
            ));
        }

        if value.len() > PERMISSION_CODE_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "permission code must be at most {PERMISSION_CODE_MAX_LENGTH} characters"
            )));
        }

        if value
            .chars()
            .any(|character| character.is_whitespace() || character.is_control())
        {
            return Err(AppError::Validation(format!(
                "permission code '{}' must not contain whitespace or control characters",
                value.escape_debug()
            )));
        }

        Ok(Self(value))
    }

    /// Returns the stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for PermissionCode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionCode> for String {
    fn from(value: PermissionCode) -> Self {
        value.0
    }
}

impl Display for PermissionCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Unique identifier for a permission row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionId(Uuid);

impl PermissionId {
    /// Creates a random permission identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a permission identifier from an existing UUID value.
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

impl Default for PermissionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for a role row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Grantable capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    id: PermissionId,
    code: PermissionCode,
    name: NonEmptyString,
}

impl Permission {
    /// Creates a validated permission definition.
    pub fn new(id: PermissionId, code: PermissionCode, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id,
            code,
            name: NonEmptyString::new(name)?,
        })
    }

    /// Returns the permission identifier.
    #[must_use]
    pub fn id(&self) -> PermissionId {
        self.id
    }

    /// Returns the unique permission code.
    #[must_use]
    pub fn code(&self) -> &PermissionCode {
        &self.code
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Named bundle of permissions assignable to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    id: RoleId,
    code: NonEmptyString,
    name: NonEmptyString,
}

impl Role {
    /// Creates a validated role definition.
    pub fn new(id: RoleId, code: impl Into<String>, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            id,
            code: NonEmptyString::new(code)?,
            name: NonEmptyString::new(name)?,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the unique role code.
    #[must_use]
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

/// Grant of one permission to one role. Pairs are unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RolePermission {
    /// Role receiving the grant.
    pub role_id: RoleId,
    /// Granted permission.
    pub permission_id: PermissionId,
}

/// Non-empty list of permission codes protecting a route.
///
/// Holding any one of the listed codes satisfies the requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PermissionCode>", into = "Vec<PermissionCode>")]
pub struct RequiredPermissions(Vec<PermissionCode>);

impl RequiredPermissions {
    /// Creates a requirement list, dropping duplicates while keeping order.
    pub fn new(codes: Vec<PermissionCode>) -> AppResult<Self> {
        let mut unique = Vec::with_capacity(codes.len());
        for code in codes {
            if !unique.contains(&code) {
                unique.push(code);
            }
        }

        if unique.is_empty() {
            return Err(AppError::Validation(
                "required permissions must list at least one code".to_owned(),
            ));
        }

        Ok(Self(unique))
    }

    /// Parses a requirement list from raw code strings.
    pub fn parse<I, S>(codes: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes = codes
            .into_iter()
            .map(PermissionCode::new)
            .collect::<AppResult<Vec<_>>>()?;
        Self::new(codes)
    }

    /// Returns the listed codes.
    #[must_use]
    pub fn codes(&self) -> &[PermissionCode] {
        &self.0
    }
}

impl TryFrom<Vec<PermissionCode>> for RequiredPermissions {
    type Error = AppError;

    fn try_from(value: Vec<PermissionCode>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RequiredPermissions> for Vec<PermissionCode> {
    fn from(value: RequiredPermissions) -> Self {
        value.0
    }
}

/// Set of permission codes a subject currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions(BTreeSet<PermissionCode>);

impl EffectivePermissions {
    /// Creates an empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns whether the set holds the exact code.
    #[must_use]
    pub fn contains(&self, code: &PermissionCode) -> bool {
        self.0.contains(code)
    }

    /// Returns whether the set holds at least one required code.
    #[must_use]
    pub fn intersects(&self, required: &RequiredPermissions) -> bool {
        required.codes().iter().any(|code| self.0.contains(code))
    }

    /// Returns the number of held codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether no codes are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &PermissionCode> {
        self.0.iter()
    }
}

impl FromIterator<PermissionCode> for EffectivePermissions {
    fn from_iter<T: IntoIterator<Item = PermissionCode>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for EffectivePermissions {
    type Item = PermissionCode;
    type IntoIter = std::collections::btree_set::IntoIter<PermissionCode>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
