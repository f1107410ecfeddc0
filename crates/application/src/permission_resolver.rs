use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use campus_core::{AppError, AppResult};
use campus_domain::{EffectivePermissions, PermissionCode, RoleId, RoutePermissionRegistry, UserId};
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::{AccessChange, AuthorizationRepository, CachedPermissionSet, PermissionSetCache};

/// Default upper bound on how long a cached permission set may be served.
pub const DEFAULT_PERMISSION_CACHE_TTL_SECONDS: u32 = 30;

/// Computes effective permission sets from persisted role assignments.
///
/// With a cache attached, the resolver maintains three bounds:
/// - invalidation calls made before a write is acknowledged are observed by
///   the next resolution of the affected subjects;
/// - any other cached set lags the store by at most [`Self::max_staleness`];
/// - a cached set is never served at or past the earliest `expires_at` of the
///   assignments it was computed from.
#[derive(Clone)]
pub struct PermissionResolver {
    repository: Arc<dyn AuthorizationRepository>,
    cache: Option<Arc<dyn PermissionSetCache>>,
    cache_ttl: Duration,
    invalidation_epoch: Arc<AtomicU64>,
}

impl PermissionResolver {
    /// Creates a resolver reading the store on every call.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self {
            repository,
            cache: None,
            cache_ttl: Duration::seconds(i64::from(DEFAULT_PERMISSION_CACHE_TTL_SECONDS)),
            invalidation_epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attaches a cache whose entries live at most `ttl_seconds`.
    ///
    /// A zero ttl leaves the resolver uncached.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn PermissionSetCache>, ttl_seconds: u32) -> Self {
        if ttl_seconds == 0 {
            self.cache = None;
            return self;
        }

        self.cache = Some(cache);
        self.cache_ttl = Duration::seconds(i64::from(ttl_seconds));
        self
    }

    /// Returns the bound on how stale a served set may be for subjects whose
    /// access changed without a local invalidation, or `None` when uncached.
    #[must_use]
    pub fn max_staleness(&self) -> Option<Duration> {
        self.cache.as_ref().map(|_| self.cache_ttl)
    }

    /// Returns the effective permission set of `user_id` at `as_of`.
    ///
    /// Unknown subjects resolve to the empty set. Store failures surface as
    /// [`AppError::Unavailable`].
    pub async fn resolve(
        &self,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> AppResult<EffectivePermissions> {
        let Some(cache) = &self.cache else {
            return Ok(self.resolve_from_store(user_id, as_of).await?.permissions);
        };

        match cache.get_permission_set(user_id).await {
            Ok(Some(entry)) if entry.covers(as_of) => return Ok(entry.permissions),
            Ok(_) => {}
            Err(error) => warn!(%user_id, %error, "permission cache read failed, reading store"),
        }

        let epoch = self.invalidation_epoch.load(Ordering::Acquire);
        let entry = self.resolve_from_store(user_id, as_of).await?;
        let permissions = entry.permissions.clone();

        // An invalidation raced the store read; the entry may predate it.
        if epoch != self.invalidation_epoch.load(Ordering::Acquire) {
            return Ok(permissions);
        }

        if entry.valid_until > Utc::now() {
            if let Err(error) = cache.put_permission_set(user_id, entry).await {
                warn!(%user_id, %error, "permission cache write failed");
            }

            // An invalidation landed while the put was in flight and may have
            // run before it; drop whatever the put wrote.
            if epoch != self.invalidation_epoch.load(Ordering::Acquire) {
                if let Err(error) = cache.invalidate_subject(user_id).await {
                    warn!(%user_id, %error, "permission cache invalidation failed");
                }
            }
        }

        Ok(permissions)
    }

    /// Returns the effective permission set of `user_id` now.
    pub async fn resolve_current(&self, user_id: UserId) -> AppResult<EffectivePermissions> {
        self.resolve(user_id, Utc::now()).await
    }

    /// Drops cached state affected by one store write.
    pub async fn apply_change(&self, change: AccessChange) {
        self.invalidation_epoch.fetch_add(1, Ordering::AcqRel);

        let Some(cache) = &self.cache else {
            return;
        };

        let result = match change {
            AccessChange::Subject(user_id) => cache.invalidate_subject(user_id).await,
            AccessChange::Role(role_id) => cache.invalidate_role(role_id).await,
            AccessChange::All => cache.invalidate_all().await,
        };

        if let Err(error) = result {
            warn!(?change, %error, "permission cache invalidation failed");
        }
    }

    /// Drops the cached set of one subject.
    pub async fn invalidate_subject(&self, user_id: UserId) {
        self.apply_change(AccessChange::Subject(user_id)).await;
    }

    /// Drops every cached set the role contributed to.
    pub async fn invalidate_role(&self, role_id: RoleId) {
        self.apply_change(AccessChange::Role(role_id)).await;
    }

    /// Returns registry permission codes the store does not define.
    pub async fn unknown_registry_codes(
        &self,
        registry: &RoutePermissionRegistry,
    ) -> AppResult<Vec<PermissionCode>> {
        let known = self
            .repository
            .list_permission_codes()
            .await?
            .into_iter()
            .collect::<BTreeSet<_>>();

        let referenced = registry
            .entries()
            .iter()
            .flat_map(|entry| entry.required().codes().iter().cloned())
            .collect::<BTreeSet<_>>();

        Ok(referenced.difference(&known).cloned().collect())
    }

    async fn resolve_from_store(
        &self,
        user_id: UserId,
        as_of: DateTime<Utc>,
    ) -> AppResult<CachedPermissionSet> {
        let assignments = self
            .repository
            .list_effective_assignments(user_id, as_of)
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to read role assignments for '{user_id}': {error}"
                ))
            })?;

        let effective = assignments
            .iter()
            .filter(|assignment| assignment.user_id == user_id && assignment.is_effective_at(as_of))
            .collect::<Vec<_>>();

        let role_ids = effective
            .iter()
            .map(|assignment| assignment.role_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();

        let permissions = if role_ids.is_empty() {
            EffectivePermissions::empty()
        } else {
            self.repository
                .list_permission_codes_for_roles(&role_ids)
                .await
                .map_err(|error| {
                    AppError::Unavailable(format!(
                        "failed to read role permissions for '{user_id}': {error}"
                    ))
                })?
                .into_iter()
                .collect()
        };

        let ttl_bound = as_of + self.cache_ttl;
        let valid_until = effective
            .iter()
            .filter_map(|assignment| assignment.expires_at)
            .min()
            .map_or(ttl_bound, |expires_at| expires_at.min(ttl_bound));

        Ok(CachedPermissionSet {
            permissions,
            role_ids,
            resolved_at: as_of,
            valid_until,
        })
    }
}
