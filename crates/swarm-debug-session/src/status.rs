//! Read-only view of the coordinator for operational introspection.

use serde::Serialize;
use serde_json::Value;
use swarm_debug_core::{Analyzer, MemoryStore, keys};

use crate::{
    coordinator::Coordinator,
    memory::{list_keys, load_value},
};

/// Snapshot returned by [`Coordinator::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinationStatus {
    pub swarm_initialized: bool,
    pub agent_count: usize,
    pub coordination_log_entries: usize,
    pub memory_db_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_names: Option<Vec<String>>,
    pub debugging_sessions: usize,
}

impl<S, A> Coordinator<S, A>
where
    S: MemoryStore,
    A: Analyzer,
{
    /// Report the registry, the coordination log and the archived sessions.
    ///
    /// Sessions are counted from the records under `swarms/debugging/sessions/`
    /// plus the entries of a mapping stored at the parent key itself, if any.
    pub async fn status(&self) -> CoordinationStatus {
        let registry = self.registry().await;

        let stored = list_keys(self.store(), &keys::session_prefix()).await.len();
        let nested = match load_value(self.store(), keys::SESSIONS).await {
            Some(Value::Object(map)) => map.len(),
            _ => 0,
        };

        CoordinationStatus {
            swarm_initialized: registry.is_some(),
            agent_count: registry.as_ref().map_or(0, |r| r.len()),
            coordination_log_entries: self.coordination_log().len(),
            memory_db_exists: self.store().backing_exists(),
            agent_names: registry.as_ref().map(|r| r.names()),
            debugging_sessions: stored + nested,
        }
    }
}
