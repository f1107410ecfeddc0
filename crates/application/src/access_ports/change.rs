use campus_domain::{RoleId, UserId};

/// Write to the authorization store that affects cached permission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessChange {
    /// Assignments of one subject changed.
    Subject(UserId),
    /// Grants of one role changed.
    Role(RoleId),
    /// Scope unknown; everything must be re-read.
    All,
}
