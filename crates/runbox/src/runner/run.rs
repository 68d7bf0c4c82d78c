//! Run phase
//!
//! Executes the built or interpreted program against the submission input.

use std::time::Instant;

use tracing::{debug, instrument};

use crate::config::{LanguageConfig, ProblemConfig, RunnerSettings};
use crate::runner::{Execution, RunnerError, execute_from};
use crate::types::RunRequest;
use crate::workspace::JudgeLayout;

/// Execute the program with the staged input
#[instrument(skip(layout, settings, problem, language))]
pub async fn run(
    layout: &JudgeLayout,
    settings: &RunnerSettings,
    problem: &ProblemConfig,
    language: &LanguageConfig,
) -> Result<Execution, RunnerError> {
    let started = Instant::now();

    // Input is fully copied before the child exists
    let stdin = layout.stage_input().await?;

    let request = RunRequest::run(language.run_command_line(), layout.runtime_dir())
        .with_stdin(stdin)
        .with_time_limit(problem.time_limit())
        .with_output_limit(settings.effective_output_limit(problem))
        .with_sink_mode(settings.sink_mode);

    debug!(command = ?request.command_line, "executing program");

    let execution = execute_from(&request, started).await?;

    if settings.persist_output {
        layout.persist_outputs(&execution.streams).await?;
    }

    debug!(
        outcome = ?execution.outcome,
        spend_time = execution.verdict.spend_time,
        "execution complete"
    );

    Ok(execution)
}
