//! Core abstractions for coordinated multi-worker debugging sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `MemoryStore`, `HookRunner`, `Analyzer` - collaborator traits
//! - `HookGateway` - fail-soft hook notifications backed by a `CoordinationLog`
//! - `DebugSession`, `Findings`, `Worker` - the persisted data model
//! - `SwarmConfig` - TOML configuration

pub mod analysis;
pub mod clock;
pub mod config;
pub mod context;
pub mod coordination_log;
pub mod hooks;
pub mod keys;
pub mod model;
pub mod traits;

pub use analysis::AnalysisRequest;
pub use config::{ConfigError, SwarmConfig};
pub use context::SessionContext;
pub use coordination_log::{CoordinationLog, CoordinationLogEntry};
pub use hooks::{
    HookGateway, HookKind, HookOutput, HookParams, NoopHookRunner, NotifyLevel, RecordingHookRunner,
};
pub use model::{AgentOutcome, CommunicationMessage, DebugSession, Findings, MemoryRecord, Worker};
pub use traits::{Analyzer, AnalyzerError, HookError, HookRunner, MemoryStore, StoreError};
