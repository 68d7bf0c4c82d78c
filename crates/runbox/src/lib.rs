//! Deadline-bounded single-shot runner for code judging.
//!
//! Runbox runs exactly one build or run step of a submission inside a
//! pre-provisioned working directory and reports a single structured verdict.
//!
//! # Features
//!
//! - **Wall-clock deadline**: The child runs in its own process group, which is killed when the deadline fires.
//! - **Bounded capture**: stdout and stderr are drained concurrently into byte-counting sinks with a hard cap.
//! - **Priority-ordered verdicts**: Timeout, then output overflow, then exit status.
//! - **Judge layout**: Loads problem/language configs and stages input the way the judge image lays them out.

pub use config::{ConfigError, EXAMPLE_SETTINGS, LanguageConfig, ProblemConfig, RunnerSettings};
pub use runner::{
    BoundedSink, Capture, Execution, Outcome, OUTPUT_LIMIT_EXCEEDED, Runner, RunnerError,
    SinkMode, Streams, TIME_LIMIT_EXCEEDED, execute,
};
pub use types::{
    BUILD_TIME_LIMIT, DEFAULT_OUTPUT_LIMIT, DEFAULT_TIME_LIMIT, Phase, RunRequest, Verdict,
};
pub use workspace::{JudgeLayout, WorkspaceError};

pub mod config;
pub mod runner;
pub mod types;
pub mod workspace;
