//! Single-shot runner
//!
//! Runs exactly one build or run step under a deadline, captures its output
//! through bounded sinks and resolves what happened into a [`Verdict`].

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, instrument};

pub use crate::runner::build::build;
pub use crate::runner::deadline::{Deadline, ProcessGroup, Termination};
pub use crate::runner::run::run;
pub use crate::runner::sink::{BoundedSink, SinkMode};
pub use crate::runner::supervisor::{Capture, DRAIN_GRACE, Observation, Streams, supervise};
pub use crate::runner::verdict::{
    OUTPUT_LIMIT_EXCEEDED, Outcome, Signals, TIME_LIMIT_EXCEEDED, assemble, resolve,
};

mod build;
mod deadline;
mod run;
mod sink;
mod supervisor;
mod verdict;

use crate::{
    config::{ConfigError, LanguageConfig, ProblemConfig, RunnerSettings},
    types::{Phase, RunRequest, Verdict},
    workspace::{JudgeLayout, WorkspaceError},
};

/// Setup failures. None of these are judged outcomes: the invocation aborts
/// without a verdict.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("command line is empty")]
    EmptyCommand,

    #[error("working directory {0} does not exist or is not a directory")]
    WorkingDir(PathBuf),

    #[error("failed to open input {path}: {source}")]
    Stdin {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child {0} was not piped")]
    MissingPipe(&'static str),

    #[error("failed to capture child output: {0}")]
    Capture(#[source] std::io::Error),

    #[error("failed to wait for child: {0}")]
    Wait(#[source] std::io::Error),

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// One finished step: the verdict plus what it was decided from
#[derive(Debug, Clone)]
pub struct Execution {
    pub outcome: Outcome,
    pub verdict: Verdict,
    pub streams: Streams,
}

/// Run a request and resolve its verdict
pub async fn execute(request: &RunRequest) -> Result<Execution, RunnerError> {
    execute_from(request, Instant::now()).await
}

/// Like [`execute`], with `spend_time` measured from `started`
#[instrument(skip(request, started), fields(phase = ?request.phase))]
pub(crate) async fn execute_from(
    request: &RunRequest,
    started: Instant,
) -> Result<Execution, RunnerError> {
    let observation = supervise(request).await?;

    let outcome = resolve(&Signals::from(&observation));
    let verdict = assemble(
        request.phase,
        outcome,
        &observation.streams,
        started.elapsed(),
    );

    debug!(
        ?outcome,
        spend_time = verdict.spend_time,
        "verdict resolved"
    );

    Ok(Execution {
        outcome,
        verdict,
        streams: observation.streams,
    })
}

/// High-level runner over a judge root
#[derive(Debug, Clone)]
pub struct Runner {
    settings: RunnerSettings,
}

impl Runner {
    /// Create a new runner with the given settings
    pub fn new(settings: RunnerSettings) -> Self {
        Self { settings }
    }

    /// Create a new runner with default settings
    pub fn with_defaults() -> Self {
        Self {
            settings: RunnerSettings::default(),
        }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    /// Run an ad-hoc request
    pub async fn execute(&self, request: &RunRequest) -> Result<Execution, RunnerError> {
        execute(request).await
    }

    /// Compile the submission in the runtime directory
    pub async fn build(
        &self,
        layout: &JudgeLayout,
        language: &LanguageConfig,
    ) -> Result<Execution, RunnerError> {
        build::build(layout, &self.settings, language).await
    }

    /// Run the program against the submission input
    pub async fn run(
        &self,
        layout: &JudgeLayout,
        problem: &ProblemConfig,
        language: &LanguageConfig,
    ) -> Result<Execution, RunnerError> {
        run::run(layout, &self.settings, problem, language).await
    }

    /// Run whichever phase the problem config asks for
    pub async fn judge(
        &self,
        layout: &JudgeLayout,
        problem: &ProblemConfig,
        language: &LanguageConfig,
    ) -> Result<Verdict, RunnerError> {
        let execution = match problem.phase() {
            Phase::Build => self.build(layout, language).await?,
            Phase::Run => self.run(layout, problem, language).await?,
        };
        Ok(execution.verdict)
    }
}
