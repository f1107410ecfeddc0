//! Route catalog shipped with the application.

use crate::route::RouteMethod::{self, Any, Delete, Get, Post, Put};
use crate::route_registry::{RouteCatalog, RouteCatalogEntry};

/// Version reported for the catalog compiled into the binary.
pub const BUILTIN_ROUTE_CATALOG_VERSION: &str = "builtin-2026.1";

type CatalogRow = (RouteMethod, &'static str, &'static [&'static str]);

const HR_ROUTES: &[CatalogRow] = &[
    (Get, "/api/hr/employees", &["hr.employees.view"]),
    (Post, "/api/hr/employees", &["hr.employees.create"]),
    (Get, "/api/hr/employees/[id]", &["hr.employees.view"]),
    (Put, "/api/hr/employees/[id]", &["hr.employees.update"]),
    (Delete, "/api/hr/employees/[id]", &["hr.employees.delete"]),
    (Get, "/api/hr/employees/[id]/contracts", &["hr.contracts.view"]),
    (Post, "/api/hr/employees/[id]/contracts", &["hr.contracts.manage"]),
    (Get, "/api/hr/positions", &["hr.positions.view"]),
    (Post, "/api/hr/positions", &["hr.positions.manage"]),
    (Put, "/api/hr/positions/[id]", &["hr.positions.manage"]),
    (Delete, "/api/hr/positions/[id]", &["hr.positions.manage"]),
    (Get, "/api/hr/leave-requests", &["hr.leave.view", "hr.leave.approve"]),
    (Post, "/api/hr/leave-requests", &["hr.leave.request"]),
    (Put, "/api/hr/leave-requests/[id]/approval", &["hr.leave.approve"]),
    (Get, "/api/hr/dashboard/stats", &["hr.dashboard.view"]),
    (Get, "/hr/dashboard", &["hr.dashboard.view"]),
    (Get, "/hr/employees", &["hr.employees.view"]),
    (Get, "/hr/employees/new", &["hr.employees.create"]),
    (Get, "/hr/employees/[id]", &["hr.employees.view"]),
    (Get, "/hr/employees/[id]/edit", &["hr.employees.update"]),
    (Get, "/hr/positions", &["hr.positions.view"]),
    (Get, "/hr/leave", &["hr.leave.view", "hr.leave.request"]),
];

const ORG_ROUTES: &[CatalogRow] = &[
    (Get, "/api/org/units", &["org_unit.unit.view"]),
    (Post, "/api/org/units", &["org_unit.unit.create"]),
    (Get, "/api/org/units/tree", &["org_unit.unit.view"]),
    (Get, "/api/org/units/[id]", &["org_unit.unit.view"]),
    (Put, "/api/org/units/[id]", &["org_unit.unit.update"]),
    (Delete, "/api/org/units/[id]", &["org_unit.unit.delete"]),
    (Get, "/api/org/units/[id]/members", &["org_unit.member.view"]),
    (Post, "/api/org/units/[id]/members", &["org_unit.member.manage"]),
    (
        Delete,
        "/api/org/units/[id]/members/[member_id]",
        &["org_unit.member.manage"],
    ),
    (Get, "/org/units", &["org_unit.unit.view"]),
    (Get, "/org/chart", &["org_unit.unit.view"]),
    (Get, "/org/unit/[id]", &["org_unit.unit.view"]),
    (Get, "/org/unit/[id]/edit", &["org_unit.unit.update"]),
];

const TRAINING_ROUTES: &[CatalogRow] = &[
    (Get, "/api/training/courses", &["training.course.view"]),
    (Post, "/api/training/courses", &["training.course.create"]),
    (Get, "/api/training/courses/[id]", &["training.course.view"]),
    (Put, "/api/training/courses/[id]", &["training.course.update"]),
    (Delete, "/api/training/courses/[id]", &["training.course.delete"]),
    (Get, "/api/training/programs", &["training.program.view"]),
    (Post, "/api/training/programs", &["training.program.manage"]),
    (Put, "/api/training/programs/[id]", &["training.program.manage"]),
    (Get, "/api/training/sessions", &["training.session.view"]),
    (Post, "/api/training/sessions", &["training.session.manage"]),
    (
        Get,
        "/api/training/sessions/[id]/enrollments",
        &["training.enrollment.view", "training.session.manage"],
    ),
    (
        Post,
        "/api/training/sessions/[id]/enrollments",
        &["training.enrollment.manage"],
    ),
    (Get, "/training/courses", &["training.course.view"]),
    (Get, "/training/courses/[id]", &["training.course.view"]),
    (Get, "/training/programs", &["training.program.view"]),
    (Get, "/training/sessions", &["training.session.view"]),
];

const ADMIN_ROUTES: &[CatalogRow] = &[
    (Any, "/api/admin/roles", &["admin.roles.manage"]),
    (Any, "/api/admin/roles/[id]", &["admin.roles.manage"]),
    (Any, "/api/admin/roles/[id]/permissions", &["admin.roles.manage"]),
    (
        Any,
        "/api/admin/users/[id]/roles",
        &["admin.roles.assign", "admin.roles.manage"],
    ),
    (Get, "/api/admin/access-log", &["admin.audit.view"]),
    (Get, "/admin/roles", &["admin.roles.manage"]),
    (Get, "/admin/access-log", &["admin.audit.view"]),
];

/// Returns the catalog compiled into the binary.
#[must_use]
pub fn builtin_route_catalog() -> RouteCatalog {
    let routes = [HR_ROUTES, ORG_ROUTES, TRAINING_ROUTES, ADMIN_ROUTES]
        .into_iter()
        .flatten()
        .map(|(method, path, permissions)| RouteCatalogEntry::new(*method, *path, permissions))
        .collect();

    RouteCatalog {
        version: BUILTIN_ROUTE_CATALOG_VERSION.to_owned(),
        routes,
    }
}
