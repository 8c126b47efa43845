//! Records persisted in, or produced from, the shared memory store.

use std::{borrow::Cow, fmt, num::NonZeroU32};

use chrono::{DateTime, Duration, Utc};
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::Value;

use crate::{SessionContext, clock, traits::StoreError};

/// Prefix marking a worker result that is an error rather than an analysis.
pub const ERROR_PREFIX: &str = "Error: ";

/// One row of the memory store.
///
/// `value` holds the canonical JSON text exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub key: String,
    pub value: String,
    pub timestamp: String,
    /// Lifetime in seconds, counted from `timestamp`.
    pub ttl: Option<u32>,
}

impl MemoryRecord {
    /// Encode `value` into a record stamped with the current time.
    #[must_use]
    pub fn new(key: impl Into<String>, value: &Value, ttl: Option<u32>) -> Self {
        Self {
            key: key.into(),
            value: value.to_string(),
            timestamp: clock::iso_timestamp(clock::now()),
            ttl,
        }
    }

    /// Decode the stored JSON text.
    ///
    /// # Errors
    /// Returns [`StoreError::Decode`] if the text is not valid JSON.
    pub fn decode(&self) -> Result<Value, StoreError> {
        serde_json::from_str(&self.value).map_err(|source| StoreError::Decode {
            key: self.key.clone(),
            source,
        })
    }

    /// Instant after which the record reads as absent.
    ///
    /// `None` when there is no TTL or the timestamp is unparseable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ttl = self.ttl?;
        let written = clock::parse_timestamp(&self.timestamp)?;
        written.checked_add_signed(Duration::seconds(i64::from(ttl)))
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

/// A named specialist taking part in dispatch.
///
/// Immutable once built; the registry owns every worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worker {
    name: String,
    role_prompt: String,
    max_iterations: NonZeroU32,
}

impl Worker {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        role_prompt: impl Into<String>,
        max_iterations: NonZeroU32,
    ) -> Self {
        Self {
            name: name.into(),
            role_prompt: role_prompt.into(),
            max_iterations,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role description handed to the analysis backend verbatim.
    #[must_use]
    pub fn role_prompt(&self) -> &str {
        &self.role_prompt
    }

    /// Iteration budget handed to the analysis backend verbatim.
    #[must_use]
    pub const fn max_iterations(&self) -> NonZeroU32 {
        self.max_iterations
    }
}

/// Result of one worker's analysis.
///
/// Persisted as a plain string; failures carry the `"Error: "` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    Completed(String),
    Failed(String),
}

impl AgentOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Text as persisted and shown to later workers.
    #[must_use]
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Completed(text) => Cow::Borrowed(text),
            Self::Failed(message) => Cow::Owned(format!("{ERROR_PREFIX}{message}")),
        }
    }
}

impl fmt::Display for AgentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl Serialize for AgentOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_text())
    }
}

impl<'de> Deserialize<'de> for AgentOutcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(match text.strip_prefix(ERROR_PREFIX) {
            Some(message) => Self::Failed(message.to_string()),
            None => Self::Completed(text),
        })
    }
}

/// Worker results keyed by worker name, in dispatch order.
///
/// Serialized as a JSON object whose key order is the dispatch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    entries: Vec<(String, AgentOutcome)>,
}

impl Findings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a worker's outcome. A repeated name replaces the earlier
    /// outcome in place.
    pub fn insert(&mut self, worker: impl Into<String>, outcome: AgentOutcome) {
        let worker = worker.into();
        if let Some(slot) = self.entries.iter_mut().find(|(name, _)| *name == worker) {
            slot.1 = outcome;
        } else {
            self.entries.push((worker, outcome));
        }
    }

    #[must_use]
    pub fn get(&self, worker: &str) -> Option<&AgentOutcome> {
        self.entries
            .iter()
            .find(|(name, _)| name == worker)
            .map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn contains(&self, worker: &str) -> bool {
        self.get(worker).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AgentOutcome)> {
        self.entries
            .iter()
            .map(|(name, outcome)| (name.as_str(), outcome))
    }

    /// Worker names in dispatch order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| outcome.is_success())
            .count()
    }
}

impl Serialize for Findings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, outcome) in &self.entries {
            map.serialize_entry(name, outcome)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Findings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FindingsVisitor;

        impl<'de> Visitor<'de> for FindingsVisitor {
            type Value = Findings;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of worker name to result text")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Findings, M::Error> {
                let mut findings = Findings::new();
                while let Some((name, outcome)) = access.next_entry::<String, AgentOutcome>()? {
                    findings.insert(name, outcome);
                }
                Ok(findings)
            }
        }

        deserializer.deserialize_map(FindingsVisitor)
    }
}

/// One coordinated debugging round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugSession {
    pub session_id: String,
    pub issue: String,
    pub timestamp: String,
    pub agent_results: Findings,
    pub context: SessionContext,
    pub coordinated_solution: String,
}

impl DebugSession {
    /// Session id derived from the dispatch time.
    #[must_use]
    pub fn id_for(at: DateTime<Utc>) -> String {
        format!("debug-session-{}", clock::unix_seconds(at))
    }
}

/// An addressed message left in the store for other agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationMessage {
    pub timestamp: String,
    pub from: String,
    pub to: String,
    pub message: String,
    pub session_active: bool,
}
