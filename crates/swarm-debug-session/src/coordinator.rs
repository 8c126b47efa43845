//! Coordinator for orchestrating debugging sessions.

use std::{fmt, sync::Arc, time::Duration};

use serde_json::json;
use swarm_debug_core::{
    AgentOutcome, AnalysisRequest, Analyzer, AnalyzerError, CoordinationLog, DebugSession,
    Findings, HookGateway, MemoryStore, NotifyLevel, SessionContext, SwarmConfig, Worker, clock,
    keys,
};
use tokio::sync::RwLock;

use crate::{
    memory::{load_value, store_value},
    registry::{RegistryError, WorkerRegistry},
};

/// Solution recorded when there is no worker to synthesize one.
pub const NO_WORKERS_SOLUTION: &str = "No agents available for solution generation";

const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(300);
const DEFAULT_MAX_WORKERS: usize = 5;

/// Coordinator error.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("Swarm not initialized")]
    NotInitialized,
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}

/// Lifecycle of a single session, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    ContextLoaded,
    Dispatching,
    Solving,
    Persisted,
    Notified,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::ContextLoaded => "context_loaded",
            Self::Dispatching => "dispatching",
            Self::Solving => "solving",
            Self::Persisted => "persisted",
            Self::Notified => "notified",
        })
    }
}

/// Coordinator for debugging sessions.
///
/// Holds the shared memory store, the analysis backend and the hook
/// gateway. A worker registry must be installed with
/// [`initialize`](Self::initialize) before sessions can run.
pub struct Coordinator<S, A>
where
    S: MemoryStore,
    A: Analyzer,
{
    store: S,
    analyzer: A,
    hooks: HookGateway,
    max_workers: usize,
    analysis_timeout: Duration,
    registry: RwLock<Option<Arc<WorkerRegistry>>>,
}

impl<S, A> Coordinator<S, A>
where
    S: MemoryStore,
    A: Analyzer,
{
    /// Create a new, uninitialized coordinator.
    #[must_use]
    pub fn new(store: S, analyzer: A, hooks: HookGateway) -> Self {
        Self {
            store,
            analyzer,
            hooks,
            max_workers: DEFAULT_MAX_WORKERS,
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            registry: RwLock::new(None),
        }
    }

    /// Create a coordinator using the limits from `config`.
    #[must_use]
    pub fn from_config(config: &SwarmConfig, store: S, analyzer: A, hooks: HookGateway) -> Self {
        Self::new(store, analyzer, hooks)
            .with_max_workers(config.max_workers)
            .with_analysis_timeout(config.analysis.timeout())
    }

    /// Set the registry capacity used by [`initialize`](Self::initialize).
    #[must_use]
    pub const fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Bound every individual worker call.
    #[must_use]
    pub const fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn analyzer(&self) -> &A {
        &self.analyzer
    }

    #[must_use]
    pub const fn hooks(&self) -> &HookGateway {
        &self.hooks
    }

    #[must_use]
    pub fn coordination_log(&self) -> &CoordinationLog {
        self.hooks.log()
    }

    /// The installed registry, if any.
    pub async fn registry(&self) -> Option<Arc<WorkerRegistry>> {
        self.registry.read().await.clone()
    }

    pub async fn is_initialized(&self) -> bool {
        self.registry.read().await.is_some()
    }

    /// Build the predefined specialists and install them.
    ///
    /// # Errors
    /// Returns error if the registry cannot be built; an `error` notification
    /// is fired first.
    pub async fn initialize(&self) -> Result<usize, CoordinatorError> {
        match WorkerRegistry::build(self.max_workers) {
            Ok(registry) => self.initialize_with(registry).await,
            Err(e) => {
                tracing::error!("Failed to initialize swarm: {e}");
                self.hooks
                    .notify(format!("Swarm initialization failed: {e}"), NotifyLevel::Error)
                    .await;
                Err(e.into())
            }
        }
    }

    /// Install a caller-built registry, replacing any previous one.
    ///
    /// Announces the registry through a `notify` hook and records it under
    /// `swarms/metadata`. Returns the number of workers.
    ///
    /// # Errors
    /// Returns error if the registry is larger than this coordinator allows.
    pub async fn initialize_with(&self, registry: WorkerRegistry) -> Result<usize, CoordinatorError> {
        if registry.len() > self.max_workers {
            return Err(RegistryError::CapacityExceeded {
                count: registry.len(),
                max: self.max_workers,
            }
            .into());
        }

        let agent_count = registry.len();
        let agent_names = registry.names();
        *self.registry.write().await = Some(Arc::new(registry));

        self.hooks
            .notify(
                format!("Debug swarm initialized with {agent_count} agents"),
                NotifyLevel::Success,
            )
            .await;

        let metadata = json!({
            "initialized_at": clock::iso_timestamp(clock::now()),
            "agent_count": agent_count,
            "agent_names": agent_names,
            "coordination_type": "sequential_debugging",
        });
        store_value(&self.store, keys::METADATA, &metadata).await;

        tracing::info!(agent_count, "Swarm initialized");
        Ok(agent_count)
    }

    /// Run one coordinated debugging session over `issue`.
    ///
    /// Workers run one at a time in registry order; each sees the issue and
    /// the successful results of the workers before it. Worker, hook and
    /// store failures are recorded and never abort the session.
    ///
    /// # Errors
    /// Returns [`CoordinatorError::NotInitialized`] if no registry is installed.
    pub async fn coordinate_debugging_session(
        &self,
        issue: &str,
        context: Option<SessionContext>,
    ) -> Result<DebugSession, CoordinatorError> {
        let registry = self
            .registry()
            .await
            .ok_or(CoordinatorError::NotInitialized)?;

        let started = clock::now();
        let session_id = DebugSession::id_for(started);
        log_phase(&session_id, SessionPhase::Created);

        self.hooks
            .pre_task(
                format!("Swarms debugging session: {}...", truncate_chars(issue, 100)),
                &session_id,
            )
            .await;

        let mut context = context.unwrap_or_default();
        if let Some(previous) = load_value(&self.store, keys::DEBUG_CONTEXT).await {
            tracing::info!(%session_id, "Loaded previous debugging context from memory");
            context.merge_previous_findings(previous);
        }
        log_phase(&session_id, SessionPhase::ContextLoaded);

        log_phase(&session_id, SessionPhase::Dispatching);
        let agent_results = self.dispatch(&registry, issue).await;

        log_phase(&session_id, SessionPhase::Solving);
        let coordinated_solution = self.synthesize(&registry, &agent_results).await;

        let session = DebugSession {
            session_id: session_id.clone(),
            issue: issue.to_string(),
            timestamp: clock::iso_timestamp(started),
            agent_results,
            context,
            coordinated_solution,
        };

        if store_value(&self.store, &keys::session(&session_id), &session).await {
            log_phase(&session_id, SessionPhase::Persisted);
        } else {
            tracing::warn!(%session_id, "Session record was not persisted");
        }

        self.hooks.post_task(&session_id).await;
        self.hooks
            .notify(
                format!(
                    "Debugging session completed: {} agents participated, {} succeeded",
                    session.agent_results.len(),
                    session.agent_results.success_count()
                ),
                NotifyLevel::Success,
            )
            .await;
        log_phase(&session_id, SessionPhase::Notified);

        tracing::info!(
            %session_id,
            agents = session.agent_results.len(),
            succeeded = session.agent_results.success_count(),
            "Coordinated debugging session completed"
        );
        Ok(session)
    }

    /// Run every worker in order, growing the visible findings as we go.
    async fn dispatch(&self, registry: &WorkerRegistry, issue: &str) -> Findings {
        let mut results = Findings::new();
        let mut visible = Findings::new();

        for worker in registry.workers() {
            tracing::debug!(worker = worker.name(), visible = visible.len(), "Worker analyzing");
            let request = AnalysisRequest::Investigate {
                issue: issue.to_string(),
                findings: visible.clone(),
            };

            match self.run_worker(worker, &request).await {
                Ok(text) => {
                    tracing::info!(worker = worker.name(), "Worker completed analysis");
                    visible.insert(worker.name(), AgentOutcome::Completed(text.clone()));
                    results.insert(worker.name(), AgentOutcome::Completed(text));
                }
                Err(e) => {
                    tracing::warn!(worker = worker.name(), "Worker encountered error: {e}");
                    results.insert(worker.name(), AgentOutcome::Failed(e.to_string()));
                }
            }
        }

        results
    }

    /// Ask the first worker to merge every result into one solution.
    async fn synthesize(&self, registry: &WorkerRegistry, results: &Findings) -> String {
        let Some(coordinator) = registry.coordinator() else {
            return NO_WORKERS_SOLUTION.to_string();
        };

        let request = AnalysisRequest::Synthesize {
            results: results.clone(),
        };
        match self.run_worker(coordinator, &request).await {
            Ok(solution) => solution,
            Err(e) => {
                tracing::warn!(worker = coordinator.name(), "Solution synthesis failed: {e}");
                AgentOutcome::Failed(e.to_string()).to_string()
            }
        }
    }

    async fn run_worker(
        &self,
        worker: &Worker,
        request: &AnalysisRequest,
    ) -> Result<String, AnalyzerError> {
        tokio::time::timeout(self.analysis_timeout, self.analyzer.analyze(worker, request))
            .await
            .map_err(|_| AnalyzerError::Timeout(self.analysis_timeout))?
    }
}

fn log_phase(session_id: &str, phase: SessionPhase) {
    tracing::debug!(session_id, %phase, "Session phase");
}

/// Prefix of `text` at most `max_chars` characters long.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(idx, _)| &text[..idx])
}
