// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::kv::KvStore;

/// In-memory store. The default runtime backend and the test double; TTLs are
/// honored lazily on read.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (non-expired) keys; test helper.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|(_, expires)| expires.map_or(true, |at| at > now))
            .count()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut entries = self.entries.lock().await;
        let expired = matches!(entries.get(key), Some((_, Some(at))) if *at <= Instant::now());
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
    ) -> Result<(), StoreError> {
        let expires = ttl.map(|d| Instant::now() + d);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value, expires));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let kv = MemoryKv::new();
        kv.put("a", b"1".to_vec(), None).await.expect("put");
        assert_eq!(kv.get("a").await.expect("get"), Some(b"1".to_vec()));
        kv.delete("a").await.expect("delete");
        assert_eq!(kv.get("a").await.expect("get"), None);
    }

    #[tokio::test]
    async fn expired_entries_vanish_on_read() {
        let kv = MemoryKv::new();
        kv.put("t", b"x".to_vec(), Some(Duration::from_millis(10)))
            .await
            .expect("put");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(kv.get("t").await.expect("get"), None);
        assert_eq!(kv.len().await, 0);
    }

    #[tokio::test]
    async fn overwrite_replaces_value_and_ttl() {
        let kv = MemoryKv::new();
        kv.put("k", b"old".to_vec(), Some(Duration::from_millis(10)))
            .await
            .expect("put");
        kv.put("k", b"new".to_vec(), None).await.expect("put");
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(kv.get("k").await.expect("get"), Some(b"new".to_vec()));
    }
}
