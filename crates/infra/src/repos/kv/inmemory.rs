use super::{IKVRepo, KeyValue};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct InMemoryKVRepo {
    entries: Mutex<HashMap<String, KeyValue>>,
}

impl InMemoryKVRepo {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

fn is_live(kv: &KeyValue, now: i64) -> bool {
    kv.expires_at > now
}

/// Drops expired entries, every write pays for the ones before it
fn evict_expired(entries: &mut HashMap<String, KeyValue>, now: i64) {
    entries.retain(|_, kv| is_live(kv, now));
}

#[async_trait::async_trait]
impl IKVRepo for InMemoryKVRepo {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_millis: i64,
        now: i64,
    ) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        evict_expired(&mut entries, now);
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            KeyValue {
                key: key.to_string(),
                value: value.to_string(),
                expires_at: now + ttl_millis,
            },
        );
        Ok(true)
    }

    async fn set(&self, key: &str, value: &str, ttl_millis: i64, now: i64) -> anyhow::Result<()> {
        let mut entries = self.entries.lock().unwrap();
        evict_expired(&mut entries, now);
        entries.insert(
            key.to_string(),
            KeyValue {
                key: key.to_string(),
                value: value.to_string(),
                expires_at: now + ttl_millis,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str, now: i64) -> anyhow::Result<Option<KeyValue>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).filter(|kv| is_live(kv, now)).cloned())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn delete_if_value(&self, key: &str, value: &str) -> anyhow::Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(kv) if kv.value == value => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
