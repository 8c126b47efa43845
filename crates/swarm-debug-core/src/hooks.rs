//! Hook gateway: advisory notifications fired at session boundaries.
//!
//! Every invocation is recorded in the [`CoordinationLog`]; no failure is
//! ever propagated to the caller.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use async_trait::async_trait;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    clock,
    coordination_log::{CoordinationLog, CoordinationLogEntry},
    traits::{HookError, HookRunner},
};

/// Hook kinds fired by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookKind {
    /// Session start.
    PreTask,
    /// Session end.
    PostTask,
    /// Free-text notification.
    Notify,
}

impl HookKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PreTask => "pre-task",
            Self::PostTask => "post-task",
            Self::Notify => "notify",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity carried by a `notify` hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyLevel {
    Success,
    Error,
    Info,
}

impl NotifyLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// Ordered hook parameters, each passed as a `--<key> <value>` flag pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookParams {
    pairs: Vec<(String, String)>,
}

impl HookParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Flatten into `--key value` arguments.
    #[must_use]
    pub fn to_flags(&self) -> Vec<String> {
        self.pairs
            .iter()
            .flat_map(|(k, v)| [format!("--{k}"), v.clone()])
            .collect()
    }
}

impl Serialize for HookParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (k, v) in &self.pairs {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// What a hook runner observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookOutput {
    /// Successful output carrying `stdout`.
    #[must_use]
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }

    fn failure_text(&self) -> String {
        if !self.stderr.trim().is_empty() {
            return self.stderr.clone();
        }
        match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Fire-and-forget gateway in front of a [`HookRunner`].
#[derive(Clone)]
pub struct HookGateway {
    runner: Arc<dyn HookRunner>,
    log: Arc<CoordinationLog>,
}

impl HookGateway {
    /// Create a gateway with a fresh coordination log.
    #[must_use]
    pub fn new(runner: Arc<dyn HookRunner>) -> Self {
        Self::with_log(runner, Arc::new(CoordinationLog::new()))
    }

    /// Create a gateway writing into an existing log.
    #[must_use]
    pub const fn with_log(runner: Arc<dyn HookRunner>, log: Arc<CoordinationLog>) -> Self {
        Self { runner, log }
    }

    /// Gateway that accepts every hook without doing anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopHookRunner))
    }

    #[must_use]
    pub const fn log(&self) -> &Arc<CoordinationLog> {
        &self.log
    }

    /// Invoke a hook and record the outcome. Returns whether it succeeded.
    pub async fn invoke(&self, hook: HookKind, params: HookParams) -> bool {
        let result = self.runner.run(hook, &params).await;
        let timestamp = clock::iso_timestamp(clock::now());

        let (success, output, error) = match result {
            Ok(out) if out.success() => {
                tracing::debug!(%hook, "Hook succeeded");
                (true, Some(out.stdout), None)
            }
            Ok(out) => {
                let error = out.failure_text();
                tracing::warn!(%hook, exit_code = ?out.exit_code, "Hook failed: {}", error.trim());
                (false, None, Some(error))
            }
            Err(e) => {
                tracing::warn!(%hook, "Error executing hook: {e}");
                (false, None, Some(e.to_string()))
            }
        };

        self.log.push(CoordinationLogEntry {
            timestamp,
            hook: hook.as_str().to_string(),
            params,
            success,
            output,
            error,
        });
        success
    }

    /// Session start.
    pub async fn pre_task(&self, description: impl Into<String>, task_id: &str) -> bool {
        let params = HookParams::new()
            .with("description", description)
            .with("task-id", task_id);
        self.invoke(HookKind::PreTask, params).await
    }

    /// Session end, asking the tracker to record metrics and store results.
    pub async fn post_task(&self, task_id: &str) -> bool {
        let params = HookParams::new()
            .with("task-id", task_id)
            .with("track-metrics", "true")
            .with("store-results", "true");
        self.invoke(HookKind::PostTask, params).await
    }

    pub async fn notify(&self, message: impl Into<String>, level: NotifyLevel) -> bool {
        let params = HookParams::new()
            .with("message", message)
            .with("level", level.as_str());
        self.invoke(HookKind::Notify, params).await
    }
}

/// In-process runner that accepts every hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHookRunner;

#[async_trait]
impl HookRunner for NoopHookRunner {
    async fn run(&self, _hook: HookKind, _params: &HookParams) -> Result<HookOutput, HookError> {
        Ok(HookOutput::ok(""))
    }
}

/// In-process runner that remembers every call and answers with a fixed
/// outcome.
#[derive(Debug, Default)]
pub struct RecordingHookRunner {
    calls: Mutex<Vec<(HookKind, HookParams)>>,
    fail_with: Option<String>,
}

impl RecordingHookRunner {
    /// Runner whose hooks all succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner whose hooks all fail to launch with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.into()),
        }
    }

    /// Calls received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<(HookKind, HookParams)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Hook kinds received so far, oldest first.
    #[must_use]
    pub fn kinds(&self) -> Vec<HookKind> {
        self.calls().into_iter().map(|(kind, _)| kind).collect()
    }
}

#[async_trait]
impl HookRunner for RecordingHookRunner {
    async fn run(&self, hook: HookKind, params: &HookParams) -> Result<HookOutput, HookError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((hook, params.clone()));
        match &self.fail_with {
            Some(message) => Err(HookError::Launch(message.clone())),
            None => Ok(HookOutput::ok(format!("{hook} ok"))),
        }
    }
}
