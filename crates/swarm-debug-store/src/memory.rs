//! In-memory memory store.

use std::{collections::BTreeMap, sync::RwLock};

use async_trait::async_trait;
use serde_json::Value;
use swarm_debug_core::{
    MemoryRecord,
    clock,
    traits::{MemoryStore, StoreError},
};

/// In-memory storage implementation.
///
/// Useful for tests and single-process embedding.
/// Data is lost on restart and invisible to other processes.
pub struct InMemoryStore {
    records: RwLock<BTreeMap<String, MemoryRecord>>,
}

impl InMemoryStore {
    /// Create a new in-memory store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Insert a raw record as-is, bypassing encoding.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn insert_raw(&self, record: MemoryRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?
            .insert(record.key.clone(), record);
        Ok(())
    }

    /// Number of stored records, expired ones included.
    ///
    /// # Errors
    /// Returns error if the lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self
            .records
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?
            .len())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn put_with_ttl(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<u32>,
    ) -> Result<(), StoreError> {
        self.insert_raw(MemoryRecord::new(key, value, ttl))
    }

    async fn get_record(&self, key: &str) -> Result<Option<MemoryRecord>, StoreError> {
        let now = clock::now();
        Ok(self
            .records
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?
            .get(key)
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = clock::now();
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(records
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .filter(|(_, record)| !record.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = clock::now();
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok((before - records.len()) as u64)
    }

    fn backing_exists(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio_test::assert_ok;

    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_overwrite() {
        let store = InMemoryStore::new();
        assert_ok!(store.put("k", &json!({"a": [1, 2]})).await);
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": [1, 2]})));

        assert_ok!(store.put("k", &json!("v2")).await);
        assert_eq!(store.get("k").await.unwrap(), Some(json!("v2")));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_absent_key_is_none() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("never").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupted_record_is_an_error() {
        let store = InMemoryStore::new();
        store
            .insert_raw(MemoryRecord {
                key: "bad".into(),
                value: "{oops".into(),
                timestamp: clock::iso_timestamp(clock::now()),
                ttl: None,
            })
            .unwrap();

        assert!(matches!(
            store.get("bad").await,
            Err(StoreError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_prefix_scan_is_sorted_and_bounded() {
        let store = InMemoryStore::new();
        for key in ["a/2", "a/1", "ab", "b/1", "a"] {
            store.put(key, &json!(key)).await.unwrap();
        }
        assert_eq!(store.keys_with_prefix("a/").await.unwrap(), ["a/1", "a/2"]);
    }

    #[tokio::test]
    async fn test_expired_records_read_as_absent_and_purge() {
        let store = InMemoryStore::new();
        store
            .insert_raw(MemoryRecord {
                key: "old".into(),
                value: "1".into(),
                timestamp: "2020-01-01T00:00:00Z".into(),
                ttl: Some(10),
            })
            .unwrap();
        store.put_with_ttl("fresh", &json!(2), Some(3600)).await.unwrap();

        assert_eq!(store.get("old").await.unwrap(), None);
        assert_eq!(store.get("fresh").await.unwrap(), Some(json!(2)));
        assert!(store.keys_with_prefix("").await.unwrap() == ["fresh"]);

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().unwrap(), 1);
    }
}
