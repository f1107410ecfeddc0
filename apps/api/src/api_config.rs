use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use campus_application::{
    DEFAULT_PERMISSION_CACHE_TTL_SECONDS, DEFAULT_SESSION_CLAIM_MAX_AGE_SECONDS, PermissionSource,
};
use campus_core::AppError;
use campus_infrastructure::DEFAULT_AUDIT_BUFFER_CAPACITY;
use tracing_subscriber::EnvFilter;

/// Backing store for resolved permission sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionCacheBackend {
    None,
    InMemory,
    Redis,
}

impl FromStr for PermissionCacheBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "in_memory" | "memory" => Ok(Self::InMemory),
            "redis" => Ok(Self::Redis),
            other => Err(AppError::Validation(format!(
                "PERMISSION_CACHE_BACKEND must be one of 'none', 'in_memory' or 'redis', got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub route_catalog_path: Option<PathBuf>,
    pub access_denied_redirect: String,
    pub login_path: String,
    pub permission_source: PermissionSource,
    pub permission_cache_backend: PermissionCacheBackend,
    pub permission_cache_ttl_seconds: u32,
    pub redis_url: Option<String>,
    pub audit_buffer_capacity: usize,
    pub access_change_listener: bool,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let database_url = optional("DATABASE_URL")
            .ok_or_else(|| AppError::Validation("DATABASE_URL is required".to_owned()))?;
        let frontend_url =
            optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = optional("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = optional("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = optional("SESSION_COOKIE_SECURE")
            .is_some_and(|value| value.eq_ignore_ascii_case("true"));

        let access_denied_redirect = redirect_path(
            "ACCESS_DENIED_REDIRECT",
            optional("ACCESS_DENIED_REDIRECT").unwrap_or_else(|| "/unauthorized".to_owned()),
        )?;
        let login_path = redirect_path(
            "LOGIN_PATH",
            optional("LOGIN_PATH").unwrap_or_else(|| "/login".to_owned()),
        )?;

        let claim_max_age_seconds = parse_number(
            "SESSION_CLAIM_MAX_AGE_SECONDS",
            optional("SESSION_CLAIM_MAX_AGE_SECONDS"),
            DEFAULT_SESSION_CLAIM_MAX_AGE_SECONDS,
        )?;
        let permission_source = match optional("PERMISSION_SOURCE")
            .unwrap_or_else(|| "live".to_owned())
            .to_ascii_lowercase()
            .as_str()
        {
            "live" => PermissionSource::Live,
            "session_claim" => PermissionSource::session_claim(claim_max_age_seconds),
            other => {
                return Err(AppError::Validation(format!(
                    "PERMISSION_SOURCE must be either 'live' or 'session_claim', got '{other}'"
                )));
            }
        };

        let permission_cache_backend = optional("PERMISSION_CACHE_BACKEND")
            .map(|value| value.parse::<PermissionCacheBackend>())
            .transpose()?
            .unwrap_or(PermissionCacheBackend::InMemory);
        let permission_cache_ttl_seconds = parse_number(
            "PERMISSION_CACHE_TTL_SECONDS",
            optional("PERMISSION_CACHE_TTL_SECONDS"),
            DEFAULT_PERMISSION_CACHE_TTL_SECONDS,
        )?;

        let redis_url = optional("REDIS_URL");
        if permission_cache_backend == PermissionCacheBackend::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when PERMISSION_CACHE_BACKEND=redis".to_owned(),
            ));
        }

        let audit_buffer_capacity = parse_number(
            "AUDIT_BUFFER_CAPACITY",
            optional("AUDIT_BUFFER_CAPACITY"),
            DEFAULT_AUDIT_BUFFER_CAPACITY,
        )?;
        let access_change_listener = optional("ACCESS_CHANGE_LISTENER")
            .is_none_or(|value| !value.eq_ignore_ascii_case("false"));

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            route_catalog_path: optional("ROUTE_CATALOG_PATH").map(PathBuf::from),
            access_denied_redirect,
            login_path,
            permission_source,
            permission_cache_backend,
            permission_cache_ttl_seconds,
            redis_url,
            audit_buffer_capacity,
            access_change_listener,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_number<T: FromStr>(name: &str, value: Option<String>, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    value.map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}")))
    })
}

fn redirect_path(name: &str, value: String) -> Result<String, AppError> {
    if !value.starts_with('/') || value.starts_with("//") {
        return Err(AppError::Validation(format!(
            "{name} must be an absolute local path, got '{value}'"
        )));
    }

    Ok(value)
}
