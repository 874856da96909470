use super::{IKVRepo, KeyValue};
use sqlx::{FromRow, PgPool};
use tracing::error;

pub struct PostgresKVRepo {
    pool: PgPool,
}

impl PostgresKVRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct KeyValueRaw {
    key: String,
    value: String,
    expires_at: i64,
}

impl From<KeyValueRaw> for KeyValue {
    fn from(e: KeyValueRaw) -> Self {
        Self {
            key: e.key,
            value: e.value,
            expires_at: e.expires_at,
        }
    }
}

#[async_trait::async_trait]
impl IKVRepo for PostgresKVRepo {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_millis: i64,
        now: i64,
    ) -> anyhow::Result<bool> {
        // An expired row is taken over, a live one is left untouched
        let res = sqlx::query(
            r#"
            INSERT INTO key_values(key, value, expires_at)
            VALUES($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
            WHERE key_values.expires_at <= $4
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now + ttl_millis)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to set key: {}. DB returned error: {:?}", key, e);
            e
        })?;
        Ok(res.rows_affected() == 1)
    }

    async fn set(&self, key: &str, value: &str, ttl_millis: i64, now: i64) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO key_values(key, value, expires_at)
            VALUES($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
            SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now + ttl_millis)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Unable to set key: {}. DB returned error: {:?}", key, e);
            e
        })?;
        Ok(())
    }

    async fn get(&self, key: &str, now: i64) -> anyhow::Result<Option<KeyValue>> {
        let row = sqlx::query_as::<_, KeyValueRaw>(
            r#"
            SELECT * FROM key_values
            WHERE key = $1 AND expires_at > $2
            "#,
        )
        .bind(key)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|kv| kv.into()))
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM key_values WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_if_value(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM key_values WHERE key = $1 AND value = $2")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
