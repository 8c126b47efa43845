//! Analysis backend that runs an agent CLI once per worker call.

use std::time::Duration;

use async_trait::async_trait;
use swarm_debug_core::{
    AnalysisRequest, Worker,
    config::AnalysisConfig,
    traits::{Analyzer, AnalyzerError},
};

use crate::{
    command::{CommandBuildError, CommandBuilder, CommandParts},
    process::{ProcessError, run_with_timeout},
};

/// Runs `<base> --append-system-prompt <role> --max-turns <n> <prompt>`.
///
/// Standard output, trimmed, is the worker's result.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    builder: CommandBuilder,
    timeout: Duration,
}

impl CommandAnalyzer {
    #[must_use]
    pub fn new(base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            builder: CommandBuilder::new(base),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.command.clone(), config.timeout())
    }

    /// Command line for one analysis call.
    ///
    /// # Errors
    /// Returns error if the base command is malformed.
    pub fn command_for(
        &self,
        worker: &Worker,
        request: &AnalysisRequest,
    ) -> Result<CommandParts, CommandBuildError> {
        self.builder.build_with(&[
            "--append-system-prompt".to_string(),
            worker.role_prompt().to_string(),
            "--max-turns".to_string(),
            worker.max_iterations().to_string(),
            request.render_prompt(),
        ])
    }
}

#[async_trait]
impl Analyzer for CommandAnalyzer {
    async fn analyze(
        &self,
        worker: &Worker,
        request: &AnalysisRequest,
    ) -> Result<String, AnalyzerError> {
        let parts = self
            .command_for(worker, request)
            .map_err(|e| AnalyzerError::Launch(e.to_string()))?;

        let output = run_with_timeout(parts, self.timeout)
            .await
            .map_err(|e| match e {
                ProcessError::Timeout(after) => AnalyzerError::Timeout(after),
                ProcessError::Io(io) => AnalyzerError::Io(io),
                other => AnalyzerError::Launch(other.to_string()),
            })?;

        if output.success() {
            Ok(output.stdout.trim().to_string())
        } else {
            let reason = if output.stderr.trim().is_empty() {
                format!("{} exited with {:?}", worker.name(), output.exit_code)
            } else {
                output.stderr.trim().to_string()
            };
            Err(AnalyzerError::Failed(reason))
        }
    }
}
