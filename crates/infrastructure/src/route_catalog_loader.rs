use std::path::Path;

use campus_core::{AppError, AppResult};
use campus_domain::{RouteCatalog, RoutePermissionRegistry, builtin_route_catalog};
use tracing::info;

/// Reads a JSON route catalog artifact.
pub async fn load_route_catalog(path: &Path) -> AppResult<RouteCatalog> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|error| {
        AppError::Misconfigured(format!(
            "failed to read route catalog '{}': {error}",
            path.display()
        ))
    })?;

    parse_route_catalog(contents.as_str()).map_err(|error| {
        AppError::Misconfigured(format!("route catalog '{}': {error}", path.display()))
    })
}

/// Parses a JSON route catalog.
pub fn parse_route_catalog(contents: &str) -> AppResult<RouteCatalog> {
    serde_json::from_str(contents)
        .map_err(|error| AppError::Misconfigured(format!("invalid route catalog json: {error}")))
}

/// Builds the registry from a catalog file, or from the built-in catalog when
/// no path is configured.
pub async fn build_route_registry(path: Option<&Path>) -> AppResult<RoutePermissionRegistry> {
    let catalog = match path {
        Some(path) => load_route_catalog(path).await?,
        None => builtin_route_catalog(),
    };

    let registry = RoutePermissionRegistry::build(catalog)?;
    info!(
        version = registry.version(),
        routes = registry.entries().len(),
        "route permission registry built"
    );

    Ok(registry)
}
