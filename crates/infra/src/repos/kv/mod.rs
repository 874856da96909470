mod inmemory;
mod postgres;
#[cfg(feature = "redis")]
mod redis;

pub use inmemory::InMemoryKVRepo;
pub use postgres::PostgresKVRepo;
#[cfg(feature = "redis")]
pub use self::redis::RedisKVRepo;

use tracing::warn;

/// An entry in the key value store. Entries are only visible until `expires_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
    /// Unix millis after which the entry is gone
    pub expires_at: i64,
}

/// Key value store with expiring entries. It backs the reminder locks and the
/// processed markers, which makes it the only store shared by all workers.
///
/// `now` is passed in by the caller so that expiry follows the same clock as
/// the rest of the system. Stores with native expiry may ignore it.
#[async_trait::async_trait]
pub trait IKVRepo: Send + Sync {
    /// Stores the entry only if there is no live entry for `key`.
    /// Returns `true` if the entry was stored.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_millis: i64,
        now: i64,
    ) -> anyhow::Result<bool>;
    async fn set(&self, key: &str, value: &str, ttl_millis: i64, now: i64) -> anyhow::Result<()>;
    async fn get(&self, key: &str, now: i64) -> anyhow::Result<Option<KeyValue>>;
    async fn delete(&self, key: &str) -> anyhow::Result<()>;
    /// Deletes the entry only if it still holds `value`.
    /// Returns `true` if an entry was deleted.
    async fn delete_if_value(&self, key: &str, value: &str) -> anyhow::Result<bool>;
}

/// A held mutual exclusion lock. The token identifies the holder so that a
/// lock which expired and was taken over by someone else is never released
/// by the previous holder.
#[derive(Debug, Clone, PartialEq)]
pub struct Lock {
    pub key: String,
    token: String,
}

/// Tries to take the lock at `key`. Returns `None` if someone else holds it.
pub async fn acquire_lock(
    kv: &dyn IKVRepo,
    key: &str,
    ttl_millis: i64,
    now: i64,
) -> anyhow::Result<Option<Lock>> {
    let token = uuid::Uuid::new_v4().to_string();
    if kv.set_if_absent(key, &token, ttl_millis, now).await? {
        Ok(Some(Lock {
            key: key.to_string(),
            token,
        }))
    } else {
        Ok(None)
    }
}

pub async fn release_lock(kv: &dyn IKVRepo, lock: Lock) -> anyhow::Result<()> {
    if !kv.delete_if_value(&lock.key, &lock.token).await? {
        warn!(
            "Lock: {} expired before it was released and might be held by someone else",
            lock.key
        );
    }
    Ok(())
}

const PROCESSED_VALUE: &str = "PROCESSED";

pub async fn is_processed(kv: &dyn IKVRepo, key: &str, now: i64) -> anyhow::Result<bool> {
    Ok(kv.get(key, now).await?.is_some())
}

pub async fn mark_processed(
    kv: &dyn IKVRepo,
    key: &str,
    ttl_millis: i64,
    now: i64,
) -> anyhow::Result<()> {
    kv.set(key, PROCESSED_VALUE, ttl_millis, now).await
}
