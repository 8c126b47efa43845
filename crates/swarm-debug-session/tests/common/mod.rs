#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::Value;
use swarm_debug_core::{
    AnalysisRequest, Analyzer, AnalyzerError, HookGateway, MemoryRecord, MemoryStore,
    RecordingHookRunner, StoreError, Worker,
};
use swarm_debug_session::{DEFAULT_MAX_ITERATIONS, WorkerRegistry};
use swarm_debug_store::InMemoryStore;

pub const SOLUTION: &str = "Coordinated fix: restore the tab bar layout";

/// Analyzer returning `"<name>: placeholder analysis"` for every worker,
/// except the ones told to fail or stall.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    calls: Mutex<Vec<(String, AnalysisRequest)>>,
    failing: HashSet<String>,
    stalling: HashSet<String>,
    fail_synthesis: bool,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, worker: &str) -> Self {
        self.failing.insert(worker.to_string());
        self
    }

    pub fn stalling(mut self, worker: &str) -> Self {
        self.stalling.insert(worker.to_string());
        self
    }

    pub fn failing_synthesis(mut self) -> Self {
        self.fail_synthesis = true;
        self
    }

    pub fn calls(&self) -> Vec<(String, AnalysisRequest)> {
        self.calls.lock().unwrap().clone()
    }

    /// Investigation requests only, in dispatch order.
    pub fn investigations(&self) -> Vec<(String, AnalysisRequest)> {
        self.calls()
            .into_iter()
            .filter(|(_, request)| !request.is_synthesis())
            .collect()
    }
}

pub fn placeholder(worker: &str) -> String {
    format!("{worker}: placeholder analysis")
}

#[async_trait]
impl Analyzer for ScriptedAnalyzer {
    async fn analyze(
        &self,
        worker: &Worker,
        request: &AnalysisRequest,
    ) -> Result<String, AnalyzerError> {
        self.calls
            .lock()
            .unwrap()
            .push((worker.name().to_string(), request.clone()));

        if request.is_synthesis() {
            return if self.fail_synthesis {
                Err(AnalyzerError::Failed("synthesis backend offline".into()))
            } else {
                Ok(SOLUTION.to_string())
            };
        }
        if self.stalling.contains(worker.name()) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.failing.contains(worker.name()) {
            return Err(AnalyzerError::Failed(format!("{} crashed", worker.name())));
        }
        Ok(placeholder(worker.name()))
    }
}

/// Store whose every operation fails.
pub struct BrokenStore;

#[async_trait]
impl MemoryStore for BrokenStore {
    async fn put_with_ttl(
        &self,
        _key: &str,
        _value: &Value,
        _ttl: Option<u32>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }

    async fn get_record(&self, _key: &str) -> Result<Option<MemoryRecord>, StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }

    async fn keys_with_prefix(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        Err(StoreError::Database("disk I/O error".into()))
    }

    fn backing_exists(&self) -> bool {
        false
    }
}

pub fn worker(name: &str) -> Worker {
    Worker::new(name, format!("You are {name}."), DEFAULT_MAX_ITERATIONS)
}

pub fn registry_of(names: &[&str]) -> WorkerRegistry {
    WorkerRegistry::from_workers(names.iter().map(|n| worker(n)).collect(), 5).unwrap()
}

pub fn recording_gateway() -> (HookGateway, Arc<RecordingHookRunner>) {
    let runner = Arc::new(RecordingHookRunner::new());
    (HookGateway::new(runner.clone()), runner)
}

pub fn memory_store() -> InMemoryStore {
    InMemoryStore::new()
}
