//! Collaborator traits: storage, hook execution and worker analysis.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::{
    analysis::AnalysisRequest,
    hooks::{HookKind, HookOutput, HookParams},
    model::{MemoryRecord, Worker},
};

/// Storage error.
///
/// Absence is not an error: lookups of unknown keys return `Ok(None)`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Corrupted record for key '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Trait for durable key/value record stores.
///
/// Writes to an existing key replace the whole record.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Upsert `value` under `key` with an optional lifetime in seconds.
    async fn put_with_ttl(
        &self,
        key: &str,
        value: &Value,
        ttl: Option<u32>,
    ) -> Result<(), StoreError>;

    /// Upsert `value` under `key` without a lifetime.
    async fn put(&self, key: &str, value: &Value) -> Result<(), StoreError> {
        self.put_with_ttl(key, value, None).await
    }

    /// Get the raw record for `key`. Expired records read as absent.
    async fn get_record(&self, key: &str) -> Result<Option<MemoryRecord>, StoreError>;

    /// Get the decoded value for `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        match self.get_record(key).await? {
            Some(record) => record.decode().map(Some),
            None => Ok(None),
        }
    }

    /// Live keys starting with `prefix`, sorted.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Delete expired records, returning how many were removed.
    async fn purge_expired(&self) -> Result<u64, StoreError>;

    /// Whether the backing storage has been created.
    fn backing_exists(&self) -> bool;
}

/// Hook execution error.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Hook timed out after {0:?}")]
    Timeout(Duration),
    #[error("Hook could not be launched: {0}")]
    Launch(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for whatever actually carries a hook notification.
///
/// Implementations report what happened; classifying it as success or
/// failure is the gateway's job.
#[async_trait]
pub trait HookRunner: Send + Sync {
    async fn run(&self, hook: HookKind, params: &HookParams) -> Result<HookOutput, HookError>;
}

/// Analysis error.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Analysis timed out after {0:?}")]
    Timeout(Duration),
    #[error("Analyzer could not be launched: {0}")]
    Launch(String),
    #[error("Analysis failed: {0}")]
    Failed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for the analysis backend behind every worker.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Run `worker` against `request`, returning its text result.
    async fn analyze(&self, worker: &Worker, request: &AnalysisRequest)
    -> Result<String, AnalyzerError>;
}
