use super::{IKVRepo, KeyValue};
use redis::aio::MultiplexedConnection;

// Compare and delete has to be atomic, otherwise a lock taken over between
// the GET and the DEL would be released
const DELETE_IF_VALUE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// Key value store on Redis. Expiry is left to Redis itself (`PX`), so the
/// `now` arguments are only used to report `expires_at`.
/// All calls share one multiplexed connection, each call works on a clone of it.
pub struct RedisKVRepo {
    conn: MultiplexedConnection,
    delete_if_value: redis::Script,
}

impl RedisKVRepo {
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self {
            conn,
            delete_if_value: redis::Script::new(DELETE_IF_VALUE_SCRIPT),
        })
    }
}

#[async_trait::async_trait]
impl IKVRepo for RedisKVRepo {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_millis: i64,
        _now: i64,
    ) -> anyhow::Result<bool> {
        let mut conn = self.conn.clone();
        let res: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl_millis.max(1))
            .query_async(&mut conn)
            .await?;
        Ok(res.is_some())
    }

    async fn set(&self, key: &str, value: &str, ttl_millis: i64, _now: i64) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl_millis.max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str, now: i64) -> anyhow::Result<Option<KeyValue>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        let value = match value {
            Some(value) => value,
            None => return Ok(None),
        };
        let pttl: i64 = redis::cmd("PTTL").arg(key).query_async(&mut conn).await?;
        let expires_at = if pttl >= 0 { now + pttl } else { i64::MAX };
        Ok(Some(KeyValue {
            key: key.to_string(),
            value,
            expires_at,
        }))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(key)
            .query_async::<_, i64>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete_if_value(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .delete_if_value
            .key(key)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        Ok(deleted == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::kv::{acquire_lock, release_lock};

    /// Skipped without `REDIS_URL`
    async fn create_repo() -> Option<RedisKVRepo> {
        let redis_url = std::env::var("REDIS_URL").ok()?;
        Some(
            RedisKVRepo::new(&redis_url)
                .await
                .expect("To connect to redis"),
        )
    }

    #[actix_web::test]
    async fn shared_connection_serves_every_call() {
        let kv = match create_repo().await {
            Some(kv) => kv,
            None => return,
        };
        let key = format!("test:{}", uuid::Uuid::new_v4());

        assert!(kv.set_if_absent(&key, "a", 60_000, 0).await.unwrap());
        assert!(!kv.set_if_absent(&key, "b", 60_000, 0).await.unwrap());
        let res = kv.get(&key, 0).await.unwrap().unwrap();
        assert_eq!(res.value, "a");
        assert!(res.expires_at > 0 && res.expires_at <= 60_000);

        assert!(!kv.delete_if_value(&key, "b").await.unwrap());
        assert!(kv.delete_if_value(&key, "a").await.unwrap());
        assert!(kv.get(&key, 0).await.unwrap().is_none());

        let lock_key = format!("lock:{}", key);
        let lock = acquire_lock(&kv, &lock_key, 60_000, 0).await.unwrap().unwrap();
        assert!(acquire_lock(&kv, &lock_key, 60_000, 0).await.unwrap().is_none());
        release_lock(&kv, lock).await.unwrap();
        assert!(acquire_lock(&kv, &lock_key, 60_000, 0).await.unwrap().is_some());
        kv.delete(&lock_key).await.unwrap();
    }
}
