//! External process plumbing for hooks and worker analysis.
//!
//! Provides:
//! - Command building utilities
//! - Bounded process execution in a dedicated process group
//! - `ProcessHookRunner` - hook notifications via an external tracker
//! - `CommandAnalyzer` - worker analysis via an agent CLI

pub mod analyzer;
pub mod command;
pub mod hooks;
pub mod process;

pub use analyzer::CommandAnalyzer;
pub use command::{CommandBuilder, CommandParts};
pub use hooks::{ProcessHookRunner, gateway_from_config};
pub use process::{ProcessError, ProcessOutput, run_with_timeout};
