//! Hook runner that shells out to an external tracker.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use swarm_debug_core::{
    HookGateway, HookKind, HookOutput, HookParams,
    config::HookConfig,
    traits::{HookError, HookRunner},
};

use crate::{
    command::{CommandBuildError, CommandBuilder, CommandParts},
    process::{ProcessError, run_with_timeout},
};

/// Runs `<base> <hook-name> --<key> <value>...` as a child process.
#[derive(Debug, Clone)]
pub struct ProcessHookRunner {
    builder: CommandBuilder,
    timeout: Duration,
}

impl ProcessHookRunner {
    #[must_use]
    pub fn new(base: impl Into<String>, timeout: Duration) -> Self {
        Self {
            builder: CommandBuilder::new(base),
            timeout,
        }
    }

    #[must_use]
    pub fn from_config(config: &HookConfig) -> Self {
        Self::new(config.command.clone(), config.timeout())
    }

    /// Command line for one invocation.
    ///
    /// # Errors
    /// Returns error if the base command is malformed.
    pub fn command_for(
        &self,
        hook: HookKind,
        params: &HookParams,
    ) -> Result<CommandParts, CommandBuildError> {
        let mut args = vec![hook.as_str().to_string()];
        args.extend(params.to_flags());
        self.builder.build_with(&args)
    }
}

#[async_trait]
impl HookRunner for ProcessHookRunner {
    async fn run(&self, hook: HookKind, params: &HookParams) -> Result<HookOutput, HookError> {
        let parts = self
            .command_for(hook, params)
            .map_err(|e| HookError::Launch(e.to_string()))?;

        let output = run_with_timeout(parts, self.timeout)
            .await
            .map_err(|e| match e {
                ProcessError::Timeout(after) => HookError::Timeout(after),
                ProcessError::Io(io) => HookError::Io(io),
                other => HookError::Launch(other.to_string()),
            })?;

        Ok(HookOutput {
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Build the hook gateway described by `config`.
///
/// Disabled hooks are accepted in-process and never spawn anything.
#[must_use]
pub fn gateway_from_config(config: &HookConfig) -> HookGateway {
    if config.enabled {
        HookGateway::new(Arc::new(ProcessHookRunner::from_config(config)))
    } else {
        tracing::info!("External hooks disabled");
        HookGateway::disabled()
    }
}
