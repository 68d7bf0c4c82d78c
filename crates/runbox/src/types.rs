use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runner::SinkMode;

/// Default per-stream output cap (16 MiB)
pub const DEFAULT_OUTPUT_LIMIT: u64 = 16 * 1024 * 1024;

/// Fixed wall-clock ceiling for the build phase
pub const BUILD_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Run-phase limit used when a request does not set one
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(2);

/// Which sub-mode an invocation runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Compile the submission. No stdin, combined output capture.
    Build,

    /// Execute the built or interpreted program against staged input.
    Run,
}

impl Phase {
    pub fn is_build(&self) -> bool {
        matches!(self, Phase::Build)
    }
}

/// A single build-or-execute step
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Executable followed by its arguments
    pub command_line: Vec<String>,

    /// Directory the child starts in
    pub working_dir: PathBuf,

    /// Staged input file, fed to the child in the run phase only
    pub stdin: Option<PathBuf>,

    /// Wall-clock deadline
    pub time_limit: Duration,

    /// Byte cap applied to stdout and stderr independently
    pub output_limit: u64,

    pub phase: Phase,

    /// What a sink does with bytes past the cap
    pub sink_mode: SinkMode,
}

impl RunRequest {
    /// Create a run-phase request with default limits
    pub fn run(command_line: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            command_line,
            working_dir: working_dir.into(),
            stdin: None,
            time_limit: DEFAULT_TIME_LIMIT,
            output_limit: DEFAULT_OUTPUT_LIMIT,
            phase: Phase::Run,
            sink_mode: SinkMode::default(),
        }
    }

    /// Create a build-phase request bounded by [`BUILD_TIME_LIMIT`]
    pub fn build(command_line: Vec<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            time_limit: BUILD_TIME_LIMIT,
            phase: Phase::Build,
            ..Self::run(command_line, working_dir)
        }
    }

    /// Set the wall-clock deadline
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = limit;
        self
    }

    /// Set the per-stream output cap in bytes
    pub fn with_output_limit(mut self, bytes: u64) -> Self {
        self.output_limit = bytes;
        self
    }

    /// Set the staged input file
    pub fn with_stdin(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    pub fn with_sink_mode(mut self, mode: SinkMode) -> Self {
        self.sink_mode = mode;
        self
    }

    pub fn is_build(&self) -> bool {
        self.phase.is_build()
    }
}

/// The single structured result of an invocation
///
/// Field names are the wire names of the verdict line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// True when the invocation was a build phase
    pub compile_mode: bool,

    pub is_success: bool,

    /// Captured stdout (run) or combined output of a successful build
    pub output: String,

    /// Fixed reason literal, captured stderr, or combined output of a failed build
    pub err: String,

    pub is_timeout: bool,

    /// Wall-clock milliseconds from invocation start to verdict construction
    pub spend_time: u64,
}

impl Verdict {
    /// Serialize as a single line of JSON
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
