//! Caller-supplied context attached to a debugging session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which context loaded from earlier sessions is merged.
pub const PREVIOUS_FINDINGS: &str = "previous_findings";

/// Free-form session context.
///
/// Serialized as a plain JSON object so external readers of the store see
/// the caller's keys directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext {
    metadata: Map<String, Value>,
}

impl SessionContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from an existing JSON object.
    #[must_use]
    pub const fn with_metadata(metadata: Map<String, Value>) -> Self {
        Self { metadata }
    }

    /// Get a metadata value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Set a metadata value, replacing any previous value under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Attach context persisted by earlier sessions.
    ///
    /// Overwrites a caller-supplied `previous_findings` entry.
    pub fn merge_previous_findings(&mut self, previous: Value) {
        self.set(PREVIOUS_FINDINGS, previous);
    }

    /// Context loaded from earlier sessions, if any.
    #[must_use]
    pub fn previous_findings(&self) -> Option<&Value> {
        self.get(PREVIOUS_FINDINGS)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.metadata
    }
}

impl From<Map<String, Value>> for SessionContext {
    fn from(metadata: Map<String, Value>) -> Self {
        Self::with_metadata(metadata)
    }
}
