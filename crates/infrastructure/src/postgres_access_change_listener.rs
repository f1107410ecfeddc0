use std::time::Duration;

use campus_application::{AccessChange, PermissionResolver};
use campus_core::{AppError, AppResult};
use campus_domain::{RoleId, UserId};
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Notification channel written by the access-control triggers.
pub const ACCESS_CHANGE_CHANNEL: &str = "access_control_changed";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Decodes a trigger payload such as `subject:<uuid>`, `role:<uuid>` or `all`.
#[must_use]
pub fn parse_access_change(payload: &str) -> Option<AccessChange> {
    let payload = payload.trim();
    if payload == "all" {
        return Some(AccessChange::All);
    }

    let (scope, id) = payload.split_once(':')?;
    let id = Uuid::parse_str(id).ok()?;

    match scope {
        "subject" => Some(AccessChange::Subject(UserId::from_uuid(id))),
        "role" => Some(AccessChange::Role(RoleId::from_uuid(id))),
        _ => None,
    }
}

/// Feeds Postgres change notifications into the permission resolver cache.
///
/// Notifications may be lost while disconnected, so every (re)connect
/// invalidates all cached sets.
#[derive(Clone)]
pub struct PostgresAccessChangeListener {
    pool: PgPool,
    resolver: PermissionResolver,
}

impl PostgresAccessChangeListener {
    /// Creates a listener bound to a pool and resolver.
    #[must_use]
    pub fn new(pool: PgPool, resolver: PermissionResolver) -> Self {
        Self { pool, resolver }
    }

    /// Runs the listener on a background task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(self) {
        loop {
            let mut listener = match self.subscribe().await {
                Ok(listener) => listener,
                Err(error) => {
                    warn!(%error, "access change listener could not subscribe, retrying");
                    tokio::time::sleep(RECONNECT_DELAY).await;
                    continue;
                }
            };

            self.resolver.apply_change(AccessChange::All).await;
            info!(channel = ACCESS_CHANGE_CHANNEL, "access change listener subscribed");

            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => self.handle_payload(notification.payload()).await,
                    Ok(None) => {
                        warn!("access change listener connection lost, invalidating cache");
                        self.resolver.apply_change(AccessChange::All).await;
                    }
                    Err(error) => {
                        warn!(%error, "access change listener failed, resubscribing");
                        break;
                    }
                }
            }

            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    }

    async fn subscribe(&self) -> AppResult<PgListener> {
        let mut listener = PgListener::connect_with(&self.pool).await.map_err(|error| {
            AppError::Internal(format!("failed to open access change listener: {error}"))
        })?;

        listener
            .listen(ACCESS_CHANGE_CHANNEL)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to listen on '{ACCESS_CHANGE_CHANNEL}': {error}"
                ))
            })?;

        Ok(listener)
    }

    async fn handle_payload(&self, payload: &str) {
        let change = parse_access_change(payload).unwrap_or_else(|| {
            warn!(payload, "unrecognized access change payload, invalidating cache");
            AccessChange::All
        });

        debug!(?change, "applying access change");
        self.resolver.apply_change(change).await;
    }
}
