use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::config::judge::{LanguageConfig, ProblemConfig, SourceFileName};
use crate::runner::SinkMode;
use crate::types::{BUILD_TIME_LIMIT, DEFAULT_OUTPUT_LIMIT};

pub mod judge;
mod loader;

/// Example runner settings embedded at compile time.
///
/// `runbox init` writes this out as a starter file.
pub const EXAMPLE_SETTINGS: &str = include_str!("../../runbox.example.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid source file name: {0}")]
    InvalidFileName(String),

    #[error("configuration file not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("language has no build command")]
    NotCompiled,

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings for the runner itself, independent of any submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerSettings {
    /// Judge root holding `language_config.json`, `submission/` and `runtime/`
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Default per-stream output cap in bytes.
    /// A problem's `output_limit` takes precedence.
    #[serde(default = "default_output_limit")]
    pub output_limit: u64,

    /// Build-phase ceiling in milliseconds. Never taken from the problem.
    #[serde(default = "default_build_time_limit_ms")]
    pub build_time_limit_ms: u64,

    /// Whether sinks drop bytes past the cap or forward them
    #[serde(default)]
    pub sink_mode: SinkMode,

    /// Write captured run-phase stdout/stderr to `out.txt` / `err.txt`
    #[serde(default = "default_persist_output")]
    pub persist_output: bool,
}

impl RunnerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build_time_limit(&self) -> Duration {
        Duration::from_millis(self.build_time_limit_ms)
    }

    /// Output cap for a problem, falling back to the runner default
    pub fn effective_output_limit(&self, problem: &ProblemConfig) -> u64 {
        problem.output_limit.unwrap_or(self.output_limit)
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            output_limit: default_output_limit(),
            build_time_limit_ms: default_build_time_limit_ms(),
            sink_mode: SinkMode::default(),
            persist_output: default_persist_output(),
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("/opt/judge")
}

fn default_output_limit() -> u64 {
    DEFAULT_OUTPUT_LIMIT
}

fn default_build_time_limit_ms() -> u64 {
    BUILD_TIME_LIMIT.as_millis() as u64
}

fn default_persist_output() -> bool {
    true
}
