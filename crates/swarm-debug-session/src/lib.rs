//! Orchestration of coordinated debugging sessions.
//!
//! Provides:
//! - `Coordinator` - sequential dispatch, synthesis and persistence of sessions
//! - `WorkerRegistry` - the ordered roster of specialist workers
//! - communication messages and a status report over the shared store

pub mod channel;
pub mod coordinator;
mod memory;
pub mod registry;
pub mod status;

pub use channel::{BROADCAST_TARGET, MESSAGE_SENDER};
pub use coordinator::{Coordinator, CoordinatorError, NO_WORKERS_SOLUTION, SessionPhase};
pub use registry::{DEFAULT_MAX_ITERATIONS, RegistryError, WorkerRegistry};
pub use status::CoordinationStatus;
