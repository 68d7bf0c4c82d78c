//! Build phase
//!
//! Compiles the submission in the runtime directory with the language's
//! build command. No input, combined output, fixed ceiling.

use std::time::Instant;

use tracing::{debug, instrument};

use crate::config::{LanguageConfig, RunnerSettings};
use crate::runner::{Execution, RunnerError, execute_from};
use crate::types::RunRequest;
use crate::workspace::JudgeLayout;

/// Compile the submission
///
/// The deadline is the runner's build ceiling; the problem's run-time limit
/// plays no part here.
#[instrument(skip(layout, settings, language))]
pub async fn build(
    layout: &JudgeLayout,
    settings: &RunnerSettings,
    language: &LanguageConfig,
) -> Result<Execution, RunnerError> {
    let started = Instant::now();

    let command_line = language.build_command_line()?;
    let working_dir = layout.prepare_runtime().await?;

    let request = RunRequest::build(command_line, working_dir)
        .with_time_limit(settings.build_time_limit())
        .with_output_limit(settings.output_limit)
        .with_sink_mode(settings.sink_mode);

    debug!(command = ?request.command_line, "building submission");

    let execution = execute_from(&request, started).await?;

    debug!(
        success = execution.verdict.is_success,
        outcome = ?execution.outcome,
        "build complete"
    );

    Ok(execution)
}
