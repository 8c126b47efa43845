//! The fixed roster of specialist workers.

use std::{collections::HashSet, num::NonZeroU32};

use swarm_debug_core::Worker;

/// Iteration budget given to every predefined specialist.
pub const DEFAULT_MAX_ITERATIONS: NonZeroU32 = NonZeroU32::MIN.saturating_add(2);

const FRONTEND_PROMPT: &str = "You are a frontend debugging specialist for terminal applications. \
Focus on component and state management bugs, UI rendering problems, mobile responsiveness \
and terminal interface issues. Share your findings with the other agents.";

const BACKEND_PROMPT: &str = "You are a backend debugging specialist for terminal applications. \
Focus on core execution and command processing problems, security issues, performance \
bottlenecks and inter-process communication. Share your findings with the frontend and system agents.";

const SYSTEM_PROMPT: &str = "You are a system integration debugging specialist. \
Focus on build system issues, dependency conflicts, environment configuration, deployment \
problems and CI pipeline failures. Keep track of overall system health.";

const TEST_PROMPT: &str = "You are a test debugging and coordination specialist. \
Focus on test failure analysis, TDD workflow issues, coverage gaps and integration test \
coordination. Make sure every proposed fix is properly tested.";

const PERFORMANCE_PROMPT: &str = "You are a performance debugging specialist. \
Focus on memory usage, CPU hot spots, bundle size, runtime performance and resource \
utilization. Provide performance insights to all agents.";

/// Predefined specialists in dispatch order.
const SPECIALISTS: [(&str, &str); 5] = [
    ("FrontendDebugger", FRONTEND_PROMPT),
    ("BackendDebugger", BACKEND_PROMPT),
    ("SystemIntegrator", SYSTEM_PROMPT),
    ("TestCoordinator", TEST_PROMPT),
    ("PerformanceAnalyzer", PERFORMANCE_PROMPT),
];

/// Registry error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Registry capacity must be positive")]
    ZeroCapacity,
    #[error("{count} workers exceed the registry capacity of {max}")]
    CapacityExceeded { count: usize, max: usize },
    #[error("Duplicate worker name: {0}")]
    DuplicateWorker(String),
}

/// Ordered, immutable collection of workers.
///
/// Order defines both dispatch order and which earlier results each worker
/// gets to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerRegistry {
    workers: Vec<Worker>,
    max_workers: usize,
}

impl WorkerRegistry {
    /// Build the predefined specialists, keeping the first `max_workers`.
    ///
    /// # Errors
    /// Returns [`RegistryError::ZeroCapacity`] if `max_workers` is zero.
    pub fn build(max_workers: usize) -> Result<Self, RegistryError> {
        if max_workers == 0 {
            return Err(RegistryError::ZeroCapacity);
        }
        if max_workers < SPECIALISTS.len() {
            tracing::warn!(
                max_workers,
                available = SPECIALISTS.len(),
                "Capacity below specialist count, later specialists are skipped"
            );
        }

        let workers = SPECIALISTS
            .iter()
            .take(max_workers)
            .map(|(name, prompt)| Worker::new(*name, *prompt, DEFAULT_MAX_ITERATIONS))
            .collect();
        Ok(Self {
            workers,
            max_workers,
        })
    }

    /// Build a registry from a caller-supplied roster, in the given order.
    ///
    /// # Errors
    /// Returns error if the roster is larger than `max_workers` or repeats a name.
    pub fn from_workers(workers: Vec<Worker>, max_workers: usize) -> Result<Self, RegistryError> {
        if workers.len() > max_workers {
            return Err(RegistryError::CapacityExceeded {
                count: workers.len(),
                max: max_workers,
            });
        }
        let duplicate = {
            let mut seen = HashSet::new();
            workers
                .iter()
                .find(|w| !seen.insert(w.name()))
                .map(|w| w.name().to_string())
        };
        if let Some(name) = duplicate {
            return Err(RegistryError::DuplicateWorker(name));
        }
        Ok(Self {
            workers,
            max_workers,
        })
    }

    /// Workers in dispatch order.
    #[must_use]
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Worker> {
        self.workers.iter().find(|w| w.name() == name)
    }

    /// Worker that synthesizes the final solution: the first in order.
    #[must_use]
    pub fn coordinator(&self) -> Option<&Worker> {
        self.workers.first()
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.workers.iter().map(|w| w.name().to_string()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    #[must_use]
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }
}
