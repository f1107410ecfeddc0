//! Redis-backed permission set cache.

use async_trait::async_trait;
use campus_application::{CachedPermissionSet, PermissionSetCache};
use campus_core::{AppError, AppResult};
use campus_domain::{RoleId, UserId};
use chrono::Utc;
use redis::Script;
use redis::aio::MultiplexedConnection;
use serde::{Deserialize, Serialize};

const PUT_PERMISSION_SET_SCRIPT: &str = r#"
redis.call('SET', KEYS[1], ARGV[1], 'PX', ARGV[2])
for index = 2, #KEYS do
  redis.call('SADD', KEYS[index], ARGV[3])
  redis.call('EXPIRE', KEYS[index], ARGV[4])
end
return 1
"#;

const INVALIDATE_ROLE_SCRIPT: &str = r#"
local members = redis.call('SMEMBERS', KEYS[1])
for _, member in ipairs(members) do
  redis.call('DEL', ARGV[1] .. member)
end
redis.call('DEL', KEYS[1])
return #members
"#;

#[derive(Serialize, Deserialize)]
struct StoredPermissionSet {
    generation: u64,
    entry: CachedPermissionSet,
}

/// Redis implementation of the permission set cache port.
///
/// Entries expire with their `valid_until`. Each contributing role keeps an
/// index set of subjects for role invalidation, and a generation counter
/// invalidates every entry at once.
#[derive(Clone)]
pub struct RedisPermissionSetCache {
    client: redis::Client,
    key_prefix: String,
    index_ttl_seconds: u32,
}

impl RedisPermissionSetCache {
    /// Creates a cache adapter.
    ///
    /// `index_ttl_seconds` must be at least the resolver cache ttl so a role
    /// index outlives every entry it points to.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>, index_ttl_seconds: u32) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
            index_ttl_seconds: index_ttl_seconds.max(1),
        }
    }

    fn subject_prefix(&self) -> String {
        format!("{}:subject:", self.key_prefix)
    }

    fn subject_key(&self, user_id: UserId) -> String {
        format!("{}{user_id}", self.subject_prefix())
    }

    fn role_key(&self, role_id: RoleId) -> String {
        format!("{}:role:{role_id}", self.key_prefix)
    }

    fn generation_key(&self) -> String {
        format!("{}:generation", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl PermissionSetCache for RedisPermissionSetCache {
    async fn get_permission_set(&self, user_id: UserId) -> AppResult<Option<CachedPermissionSet>> {
        let mut connection = self.connection().await?;

        let (encoded, generation): (Option<String>, Option<u64>) = redis::cmd("MGET")
            .arg(self.subject_key(user_id))
            .arg(self.generation_key())
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read permission set cache entry: {error}"))
            })?;

        let Some(encoded) = encoded else {
            return Ok(None);
        };

        let stored: StoredPermissionSet = serde_json::from_str(encoded.as_str()).map_err(|error| {
            AppError::Internal(format!("invalid permission set cache entry: {error}"))
        })?;

        if stored.generation != generation.unwrap_or_default() {
            return Ok(None);
        }

        Ok(Some(stored.entry).filter(|entry| entry.valid_until > Utc::now()))
    }

    async fn put_permission_set(
        &self,
        user_id: UserId,
        entry: CachedPermissionSet,
    ) -> AppResult<()> {
        let ttl_milliseconds = (entry.valid_until - Utc::now()).num_milliseconds();
        if ttl_milliseconds <= 0 {
            return Ok(());
        }

        let mut connection = self.connection().await?;

        let generation: Option<u64> = redis::cmd("GET")
            .arg(self.generation_key())
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read permission cache generation: {error}"))
            })?;

        let role_keys = entry
            .role_ids
            .iter()
            .map(|role_id| self.role_key(*role_id))
            .collect::<Vec<_>>();
        let payload = serde_json::to_string(&StoredPermissionSet {
            generation: generation.unwrap_or_default(),
            entry,
        })
        .map_err(|error| {
            AppError::Internal(format!("failed to encode permission set cache entry: {error}"))
        })?;

        let script = Script::new(PUT_PERMISSION_SET_SCRIPT);
        let mut invocation = script.prepare_invoke();
        invocation.key(self.subject_key(user_id));
        for role_key in role_keys {
            invocation.key(role_key);
        }
        invocation
            .arg(payload)
            .arg(ttl_milliseconds)
            .arg(user_id.to_string())
            .arg(self.index_ttl_seconds);

        invocation
            .invoke_async::<i32>(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to write permission set cache entry: {error}"))
            })?;

        Ok(())
    }

    async fn invalidate_subject(&self, user_id: UserId) -> AppResult<()> {
        let mut connection = self.connection().await?;

        redis::cmd("DEL")
            .arg(self.subject_key(user_id))
            .query_async::<i64>(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to invalidate permission set of '{user_id}': {error}"
                ))
            })?;

        Ok(())
    }

    async fn invalidate_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut connection = self.connection().await?;

        Script::new(INVALIDATE_ROLE_SCRIPT)
            .key(self.role_key(role_id))
            .arg(self.subject_prefix())
            .invoke_async::<i64>(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to invalidate permission sets of role '{role_id}': {error}"
                ))
            })?;

        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        let mut connection = self.connection().await?;

        redis::cmd("INCR")
            .arg(self.generation_key())
            .query_async::<u64>(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to bump permission cache generation: {error}"))
            })?;

        Ok(())
    }
}
