//! Immutable route -> required-permission table.

use std::collections::HashMap;

use campus_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::route::{RouteMethod, RouteTemplate, match_path, segment_count};
use crate::RequiredPermissions;

/// One declared route as written in a catalog artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCatalogEntry {
    /// Method selector, `ANY` for every method.
    pub method: RouteMethod,
    /// Path template with `[param]` dynamic segments.
    pub path: String,
    /// Codes of which any one grants access.
    pub permissions: Vec<String>,
}

impl RouteCatalogEntry {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(method: RouteMethod, path: impl Into<String>, permissions: &[&str]) -> Self {
        Self {
            method,
            path: path.into(),
            permissions: permissions.iter().map(|code| (*code).to_owned()).collect(),
        }
    }
}

/// Versioned list of route declarations loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCatalog {
    /// Artifact version reported in diagnostics.
    pub version: String,
    /// Declared routes.
    pub routes: Vec<RouteCatalogEntry>,
}

/// Validated registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    method: RouteMethod,
    template: RouteTemplate,
    required: RequiredPermissions,
}

impl RouteEntry {
    /// Returns the method selector.
    #[must_use]
    pub fn method(&self) -> RouteMethod {
        self.method
    }

    /// Returns the path template.
    #[must_use]
    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    /// Returns the required permission list.
    #[must_use]
    pub fn required(&self) -> &RequiredPermissions {
        &self.required
    }

    fn describe(&self) -> String {
        format!("{} {}", self.method, self.template)
    }
}

/// Route table built once during startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct RoutePermissionRegistry {
    version: String,
    entries: Vec<RouteEntry>,
    by_segment_count: HashMap<usize, Vec<usize>>,
}

impl RoutePermissionRegistry {
    /// Validates a catalog and builds the lookup table.
    ///
    /// Any invalid entry or ambiguous pair of entries yields
    /// [`AppError::Misconfigured`]; callers treat it as fatal.
    pub fn build(catalog: RouteCatalog) -> AppResult<Self> {
        let mut entries: Vec<RouteEntry> = Vec::with_capacity(catalog.routes.len());

        for declared in catalog.routes {
            let template = RouteTemplate::parse(&declared.path).map_err(|error| {
                AppError::Misconfigured(format!(
                    "route '{} {}' is invalid: {error}",
                    declared.method, declared.path
                ))
            })?;
            let required = RequiredPermissions::parse(declared.permissions).map_err(|error| {
                AppError::Misconfigured(format!(
                    "route '{} {}' has invalid permissions: {error}",
                    declared.method, declared.path
                ))
            })?;

            let entry = RouteEntry {
                method: declared.method,
                template,
                required,
            };

            if let Some(existing) = entries
                .iter()
                .find(|existing| conflicts_with(existing, &entry))
            {
                return Err(AppError::Misconfigured(format!(
                    "routes '{}' and '{}' are ambiguous",
                    existing.describe(),
                    entry.describe()
                )));
            }

            entries.push(entry);
        }

        let mut by_segment_count: HashMap<usize, Vec<usize>> = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            by_segment_count
                .entry(entry.template.segment_count())
                .or_default()
                .push(index);
        }

        Ok(Self {
            version: catalog.version,
            entries,
            by_segment_count,
        })
    }

    /// Resolves a request to the best matching entry.
    #[must_use]
    pub fn lookup_entry(&self, method: RouteMethod, path: &str) -> Option<&RouteEntry> {
        let candidates = self.by_segment_count.get(&segment_count(path))?;

        let mut best: Option<&RouteEntry> = None;
        for entry in candidates.iter().filter_map(|index| self.entries.get(*index)) {
            if !entry.method.accepts(method) || !match_path(&entry.template, path).matched {
                continue;
            }

            let replaces_best =
                best.is_none_or(|current| entry.template.rank() > current.template.rank());
            if replaces_best {
                best = Some(entry);
            }
        }

        best
    }

    /// Returns the permissions required by a request, if any are declared.
    #[must_use]
    pub fn lookup(&self, method: RouteMethod, path: &str) -> Option<&RequiredPermissions> {
        self.lookup_entry(method, path).map(RouteEntry::required)
    }

    /// Returns the catalog version the registry was built from.
    #[must_use]
    pub fn version(&self) -> &str {
        self.version.as_str()
    }

    /// Returns all entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }
}

/// Returns whether two entries could claim the same request with no winner.
///
/// Overlapping templates with equal dynamic-segment count but different
/// literal length are accepted on purpose: `rank` orders them at lookup, so
/// only a full `(specificity, literal_length)` tie is ambiguous.
fn conflicts_with(existing: &RouteEntry, candidate: &RouteEntry) -> bool {
    if !existing.method.overlaps(candidate.method) {
        return false;
    }

    if existing.method == candidate.method
        && existing
            .template
            .is_structurally_identical(&candidate.template)
    {
        return true;
    }

    existing.template.overlaps(&candidate.template)
        && existing.template.rank() == candidate.template.rank()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{RouteCatalog, RouteCatalogEntry, RoutePermissionRegistry};
    use crate::route::RouteMethod;
    use crate::route_catalog::builtin_route_catalog;

    fn catalog(routes: Vec<RouteCatalogEntry>) -> RouteCatalog {
        RouteCatalog {
            version: "test".to_owned(),
            routes,
        }
    }

    fn registry(routes: Vec<RouteCatalogEntry>) -> RoutePermissionRegistry {
        match RoutePermissionRegistry::build(catalog(routes)) {
            Ok(registry) => registry,
            Err(error) => panic!("fixture catalog must build: {error}"),
        }
    }

    fn required_codes(registry: &RoutePermissionRegistry, method: RouteMethod, path: &str) -> Vec<String> {
        registry
            .lookup(method, path)
            .map(|required| {
                required
                    .codes()
                    .iter()
                    .map(|code| code.as_str().to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn lookup_resolves_declared_routes() {
        let registry = registry(vec![
            RouteCatalogEntry::new(RouteMethod::Get, "/api/hr/employees", &["hr.employees.view"]),
            RouteCatalogEntry::new(RouteMethod::Post, "/api/hr/employees", &["hr.employees.create"]),
            RouteCatalogEntry::new(RouteMethod::Put, "/api/hr/employees/[id]", &["hr.employees.update"]),
        ]);

        assert_eq!(
            required_codes(&registry, RouteMethod::Get, "/api/hr/employees"),
            vec!["hr.employees.view"]
        );
        assert_eq!(
            required_codes(&registry, RouteMethod::Post, "/api/hr/employees/"),
            vec!["hr.employees.create"]
        );
        assert_eq!(
            required_codes(&registry, RouteMethod::Put, "/api/hr/employees/42"),
            vec!["hr.employees.update"]
        );
        assert!(registry.lookup(RouteMethod::Delete, "/api/hr/employees/42").is_none());
        assert!(registry.lookup(RouteMethod::Get, "/hr/some-unregistered-page").is_none());
    }

    #[test]
    fn literal_route_wins_over_dynamic_sibling() {
        let registry = registry(vec![
            RouteCatalogEntry::new(RouteMethod::Get, "/org/unit/[id]", &["org_unit.unit.view"]),
            RouteCatalogEntry::new(RouteMethod::Get, "/org/unit/tree", &["org_unit.tree.view"]),
        ]);

        assert_eq!(
            required_codes(&registry, RouteMethod::Get, "/org/unit/tree"),
            vec!["org_unit.tree.view"]
        );
        assert_eq!(
            required_codes(&registry, RouteMethod::Get, "/org/unit/17"),
            vec!["org_unit.unit.view"]
        );
    }

    #[test]
    fn literal_length_breaks_specificity_ties() {
        let registry = registry(vec![
            RouteCatalogEntry::new(RouteMethod::Get, "/a/[x]/[y]", &["short"]),
            RouteCatalogEntry::new(RouteMethod::Get, "/a/[x]/detail", &["long"]),
        ]);

        for _ in 0..3 {
            assert_eq!(
                required_codes(&registry, RouteMethod::Get, "/a/1/detail"),
                vec!["long"]
            );
        }
        assert_eq!(
            required_codes(&registry, RouteMethod::Get, "/a/1/other"),
            vec!["short"]
        );
    }

    #[test]
    fn any_method_entry_applies_to_every_method() {
        let registry = registry(vec![RouteCatalogEntry::new(
            RouteMethod::Any,
            "/api/admin/audit",
            &["admin.audit.view"],
        )]);

        assert!(registry.lookup(RouteMethod::Delete, "/api/admin/audit").is_some());
        assert!(registry.lookup(RouteMethod::Get, "/api/admin/audit").is_some());
    }

    #[test]
    fn duplicate_templates_are_rejected() {
        let result = RoutePermissionRegistry::build(catalog(vec![
            RouteCatalogEntry::new(RouteMethod::Get, "/org/unit/[id]", &["a"]),
            RouteCatalogEntry::new(RouteMethod::Get, "/org/unit/[unit_id]", &["b"]),
        ]));

        assert!(matches!(result, Err(campus_core::AppError::Misconfigured(_))));
    }

    #[test]
    fn any_method_conflicts_with_specific_method() {
        let result = RoutePermissionRegistry::build(catalog(vec![
            RouteCatalogEntry::new(RouteMethod::Any, "/hr/dashboard", &["a"]),
            RouteCatalogEntry::new(RouteMethod::Get, "/hr/dashboard", &["b"]),
        ]));

        assert!(result.is_err());
    }

    #[test]
    fn equally_ranked_overlapping_templates_are_rejected() {
        let result = RoutePermissionRegistry::build(catalog(vec![
            RouteCatalogEntry::new(RouteMethod::Get, "/x/[a]/[b]/ab", &["a"]),
            RouteCatalogEntry::new(RouteMethod::Get, "/x/[a]/ab/[b]", &["b"]),
        ]));

        assert!(result.is_err());
    }

    #[test]
    fn disjoint_methods_may_share_a_template() {
        let result = RoutePermissionRegistry::build(catalog(vec![
            RouteCatalogEntry::new(RouteMethod::Get, "/api/hr/employees/[id]", &["a"]),
            RouteCatalogEntry::new(RouteMethod::Delete, "/api/hr/employees/[id]", &["b"]),
        ]));

        assert!(result.is_ok());
    }

    #[test]
    fn invalid_entries_fail_the_build() {
        assert!(RoutePermissionRegistry::build(catalog(vec![RouteCatalogEntry::new(
            RouteMethod::Get,
            "/hr/dashboard",
            &[],
        )]))
        .is_err());
        assert!(RoutePermissionRegistry::build(catalog(vec![RouteCatalogEntry::new(
            RouteMethod::Get,
            "/docs/[...slug]",
            &["docs.view"],
        )]))
        .is_err());
    }

    #[test]
    fn catalog_deserializes_from_json() {
        let parsed: Result<RouteCatalog, _> = serde_json::from_str(
            r#"{
                "version": "2024.1",
                "routes": [
                    {"method": "GET", "path": "/hr/dashboard", "permissions": ["hr.dashboard.view"]},
                    {"method": "ANY", "path": "/api/admin/[section]", "permissions": ["admin.access"]}
                ]
            }"#,
        );

        let registry = parsed.map(RoutePermissionRegistry::build);
        assert!(matches!(registry, Ok(Ok(ref registry)) if registry.version() == "2024.1"));
    }

    #[test]
    fn every_builtin_route_resolves_to_itself() {
        let registry = match RoutePermissionRegistry::build(builtin_route_catalog()) {
            Ok(registry) => registry,
            Err(error) => panic!("built-in catalog must build: {error}"),
        };

        for entry in registry.entries() {
            let probe_method = match entry.method() {
                RouteMethod::Any => RouteMethod::Patch,
                method => method,
            };
            let path = entry.template().instantiate("sample-value-1");
            let resolved = registry.lookup_entry(probe_method, &path);
            assert_eq!(resolved, Some(entry), "lookup mismatch for {path}");
        }
    }

    proptest! {
        #[test]
        fn builtin_lookup_is_deterministic(index in 0usize..64, value in "[0-9]{1,8}") {
            let Ok(registry) = RoutePermissionRegistry::build(builtin_route_catalog()) else {
                return Err(TestCaseError::fail("built-in catalog must build"));
            };
            let entries = registry.entries();
            let entry = &entries[index % entries.len()];
            let path = entry.template().instantiate(&value);
            let method = match entry.method() {
                RouteMethod::Any => RouteMethod::Get,
                method => method,
            };

            let first = registry.lookup_entry(method, &path);
            let second = registry.lookup_entry(method, &path);
            prop_assert_eq!(first, second);
            prop_assert_eq!(first, Some(entry));
        }
    }
}
