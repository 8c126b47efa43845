//! Bounded execution of external commands.

use std::{io, process::Stdio, time::Duration};

use command_group::AsyncCommandGroup;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::command::{CommandBuildError, CommandParts};

/// Process error.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Command(#[from] CommandBuildError),
    #[error("Spawn failed: {0}")]
    SpawnFailed(#[source] io::Error),
    #[error("Process timed out after {0:?}")]
    Timeout(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Run a command to completion with null stdin and captured output.
///
/// The child is spawned in its own process group; on timeout the whole
/// group is killed.
///
/// # Errors
/// Returns error if the executable cannot be resolved or spawned, if
/// waiting fails, or if `timeout` elapses.
pub async fn run_with_timeout(
    parts: CommandParts,
    timeout: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let (program, args) = parts.into_resolved().await?;

    let mut command = tokio::process::Command::new(&program);
    command
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.group_spawn().map_err(ProcessError::SpawnFailed)?;
    tracing::debug!(program = %program.display(), ?args, "Spawned process");

    let mut stdout_task = tokio::spawn(read_pipe(child.inner().stdout.take()));
    let mut stderr_task = tokio::spawn(read_pipe(child.inner().stderr.take()));

    // Background processes may inherit the pipes, so the deadline covers
    // reading them to EOF as well as the exit of the direct child.
    let finished = tokio::time::timeout(timeout, async {
        let status = child.wait().await?;
        let stdout = (&mut stdout_task).await.unwrap_or_default();
        let stderr = (&mut stderr_task).await.unwrap_or_default();
        Ok::<_, io::Error>((status, stdout, stderr))
    })
    .await;

    let Ok(finished) = finished else {
        if let Err(e) = child.start_kill() {
            tracing::debug!("Failed to kill timed out process group: {e}");
        }
        stdout_task.abort();
        stderr_task.abort();
        let _ = child.wait().await;
        return Err(ProcessError::Timeout(timeout));
    };
    let (status, stdout, stderr) = finished?;

    Ok(ProcessOutput {
        exit_code: status.code(),
        stdout,
        stderr,
    })
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            tracing::debug!("Error reading child output: {e}");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
