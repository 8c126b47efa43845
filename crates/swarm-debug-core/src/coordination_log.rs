//! In-memory record of every hook invocation, with live broadcast.

use std::sync::{PoisonError, RwLock};

use futures::StreamExt;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

use crate::hooks::HookParams;

/// One hook invocation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinationLogEntry {
    pub timestamp: String,
    pub hook: String,
    pub params: HookParams,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Append-only coordination log.
///
/// Entries are kept for the lifetime of the process. Subscribers receive
/// entries pushed after they subscribed; `history_plus_stream` stitches
/// history and live entries together.
pub struct CoordinationLog {
    history: RwLock<Vec<CoordinationLogEntry>>,
    sender: broadcast::Sender<CoordinationLogEntry>,
}

impl Default for CoordinationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self {
            history: RwLock::new(Vec::with_capacity(16)),
            sender,
        }
    }

    /// Append an entry and notify live subscribers.
    pub fn push(&self, entry: CoordinationLogEntry) {
        let _ = self.sender.send(entry.clone()); // live listeners
        self.history
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<CoordinationLogEntry> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of failed invocations so far.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| !entry.success)
            .count()
    }

    /// Receiver for entries pushed from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinationLogEntry> {
        self.sender.subscribe()
    }

    /// Stream yielding the history first, then live entries.
    #[must_use]
    pub fn history_plus_stream(&self) -> futures::stream::BoxStream<'static, CoordinationLogEntry> {
        let rx = self.subscribe();
        let history = self.entries();

        let hist = futures::stream::iter(history);
        let live = BroadcastStream::new(rx).filter_map(|res| async move { res.ok() });

        Box::pin(hist.chain(live))
    }
}
