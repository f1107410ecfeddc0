//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod route;
mod route_catalog;
mod route_registry;
mod security;
mod user;

pub use access::{
    ACCESS_DENIED_MESSAGE, Decision, DenialBody, DenialKind, DenialResponse, RequestClass,
    UndeclaredRoutePolicy,
};
pub use route::{
    PathMatch, RouteMethod, RouteTemplate, TemplateSegment, match_path, segment_count, split_path,
};
pub use route_catalog::{BUILTIN_ROUTE_CATALOG_VERSION, builtin_route_catalog};
pub use route_registry::{RouteCatalog, RouteCatalogEntry, RouteEntry, RoutePermissionRegistry};
pub use security::{
    EffectivePermissions, Permission, PermissionCode, PermissionId, RequiredPermissions, Role,
    RoleId, RolePermission,
};
pub use user::{UserId, UserRoleAssignment};
