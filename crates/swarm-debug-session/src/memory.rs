//! Fail-soft access to the memory store.
//!
//! The orchestrator never fails because of the store: errors are logged here
//! and turned into `false` / `None`.

use serde::Serialize;
use serde_json::Value;
use swarm_debug_core::MemoryStore;

/// Serialize and write `value` under `key`. Returns whether it was stored.
pub(crate) async fn store_value<S, T>(store: &S, key: &str, value: &T) -> bool
where
    S: MemoryStore + ?Sized,
    T: Serialize + ?Sized,
{
    let value = match serde_json::to_value(value) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(key, "Failed to encode coordination memory: {e}");
            return false;
        }
    };
    match store.put(key, &value).await {
        Ok(()) => {
            tracing::debug!(key, "Stored coordination memory");
            true
        }
        Err(e) => {
            tracing::error!(key, "Failed to store coordination memory: {e}");
            false
        }
    }
}

/// Read and decode `key`. Absent, expired and unreadable records all yield `None`.
pub(crate) async fn load_value<S>(store: &S, key: &str) -> Option<Value>
where
    S: MemoryStore + ?Sized,
{
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(key, "Failed to load coordination memory: {e}");
            None
        }
    }
}

/// Keys under `prefix`, or none if the store cannot be read.
pub(crate) async fn list_keys<S>(store: &S, prefix: &str) -> Vec<String>
where
    S: MemoryStore + ?Sized,
{
    store.keys_with_prefix(prefix).await.unwrap_or_else(|e| {
        tracing::error!(prefix, "Failed to list coordination memory: {e}");
        Vec::new()
    })
}
