//! Coordinator configuration.
//!
//! Loaded from TOML; every field has a default so an empty file (or no file
//! at all) yields a working configuration.
//!
//! ```toml
//! memory_db_path = ".swarm/memory.db"
//! max_workers = 5
//!
//! [hooks]
//! command = "npx claude-flow@alpha hooks"
//! timeout_secs = 30
//! ```

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// SQLite file backing the memory store.
    pub memory_db_path: PathBuf,
    /// Upper bound on registry size.
    pub max_workers: usize,
    /// Default tracing filter for binaries.
    pub log_level: String,
    pub hooks: HookConfig,
    pub analysis: AnalysisConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            memory_db_path: PathBuf::from(".swarm/memory.db"),
            max_workers: 5,
            log_level: "info".to_string(),
            hooks: HookConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

/// External hook process settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    /// When false, hooks are accepted in-process and nothing is spawned.
    pub enabled: bool,
    /// Base command; the hook name and flags are appended.
    pub command: String,
    pub timeout_secs: u64,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "npx claude-flow@alpha hooks".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HookConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Worker analysis backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base command; role, budget and prompt are appended.
    pub command: String,
    /// Bound on a single worker call.
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            command: "claude -p".to_string(),
            timeout_secs: 300,
        }
    }
}

impl AnalysisConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SwarmConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns error if the document is malformed or fails validation.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Load from a file, falling back to defaults when it does not exist.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_workers must be positive".into()));
        }
        if self.memory_db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("memory_db_path is empty".into()));
        }
        if self.hooks.enabled && self.hooks.command.trim().is_empty() {
            return Err(ConfigError::Invalid("hooks.command is empty".into()));
        }
        if self.hooks.timeout_secs == 0 {
            return Err(ConfigError::Invalid("hooks.timeout_secs must be positive".into()));
        }
        if self.analysis.command.trim().is_empty() {
            return Err(ConfigError::Invalid("analysis.command is empty".into()));
        }
        if self.analysis.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "analysis.timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}
