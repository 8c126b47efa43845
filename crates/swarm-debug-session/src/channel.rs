//! Addressed messages left in the shared store for other agents.

use swarm_debug_core::{
    Analyzer, CommunicationMessage, MemoryStore, NotifyLevel, clock, keys,
};

use crate::{
    coordinator::{Coordinator, truncate_chars},
    memory::store_value,
};

/// Sender recorded on every message written by this system.
pub const MESSAGE_SENDER: &str = "debug_swarm";

/// Wildcard target addressing every agent.
pub const BROADCAST_TARGET: &str = "all";

impl<S, A> Coordinator<S, A>
where
    S: MemoryStore,
    A: Analyzer,
{
    /// Persist a message for `target` and announce it through a `notify` hook.
    ///
    /// Store and hook failures are logged; the message is returned either way.
    /// Two messages sent within the same second share a key and the later
    /// one wins.
    pub async fn send(&self, message: &str, target: &str) -> CommunicationMessage {
        let now = clock::now();
        let communication = CommunicationMessage {
            timestamp: clock::iso_timestamp(now),
            from: MESSAGE_SENDER.to_string(),
            to: target.to_string(),
            message: message.to_string(),
            session_active: self.is_initialized().await,
        };

        let key = keys::communication(clock::unix_seconds(now));
        store_value(self.store(), &key, &communication).await;

        self.hooks()
            .notify(
                format!(
                    "Swarm communication to {target}: {}...",
                    truncate_chars(message, 50)
                ),
                NotifyLevel::Info,
            )
            .await;

        tracing::info!(target_agent = target, %key, "Communication sent");
        communication
    }

    /// [`send`](Self::send) addressed to every agent.
    pub async fn broadcast(&self, message: &str) -> CommunicationMessage {
        self.send(message, BROADCAST_TARGET).await
    }
}
