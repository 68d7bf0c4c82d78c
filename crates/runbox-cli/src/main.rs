//! Runbox CLI
//!
//! Runs one judge build or run step and prints its verdict as a single JSON
//! line on stdout. Logs go to stderr. A setup failure exits non-zero without
//! printing a verdict.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use runbox::{
    EXAMPLE_SETTINGS, JudgeLayout, LanguageConfig, ProblemConfig, RunRequest, Runner,
    RunnerSettings, Verdict,
};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "runbox")]
#[command(about = "Run one judge build or run step and report its verdict")]
#[command(version)]
struct Cli {
    /// Path to a runner settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Judge root (overrides the settings file)
    #[arg(short, long, global = true)]
    base_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the phase named by the judge root's problem config (default)
    Judge,

    /// Run an arbitrary command as a run phase
    Exec {
        /// Time limit in milliseconds
        #[arg(short, long, default_value = "2000")]
        time_limit: u64,

        /// Input file fed to the command's stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        #[command(flatten)]
        target: Target,
    },

    /// Run an arbitrary command as a build phase
    Build {
        /// Time limit in milliseconds (default: the build ceiling)
        #[arg(short, long)]
        time_limit: Option<u64>,

        #[command(flatten)]
        target: Target,
    },

    /// Write an example settings file
    Init {
        /// Output path
        #[arg(short, long, default_value = "runbox.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show effective settings
    ShowConfig,
}

#[derive(Args)]
struct Target {
    /// Working directory
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Per-stream output cap in bytes (default: from settings)
    #[arg(short, long)]
    output_limit: Option<u64>,

    /// Command and arguments
    #[arg(trailing_var_arg = true, required = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    // stdout is reserved for the verdict line
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = if let Some(ref path) = cli.config {
        info!(?path, "loading settings");
        RunnerSettings::from_file(path).context("failed to load settings")?
    } else {
        debug!("using default settings");
        RunnerSettings::default()
    };
    if let Some(base_dir) = cli.base_dir {
        settings.base_dir = base_dir;
    }

    match cli.command.unwrap_or(Commands::Judge) {
        Commands::Judge => run_judge(settings).await,
        Commands::Exec {
            time_limit,
            input,
            target,
        } => {
            let mut request = RunRequest::run(target.command, target.dir)
                .with_time_limit(Duration::from_millis(time_limit))
                .with_output_limit(target.output_limit.unwrap_or(settings.output_limit))
                .with_sink_mode(settings.sink_mode);
            if let Some(input) = input {
                request = request.with_stdin(input);
            }
            run_request(settings, request).await
        }
        Commands::Build { time_limit, target } => {
            let time_limit = time_limit
                .map(Duration::from_millis)
                .unwrap_or_else(|| settings.build_time_limit());
            let request = RunRequest::build(target.command, target.dir)
                .with_time_limit(time_limit)
                .with_output_limit(target.output_limit.unwrap_or(settings.output_limit))
                .with_sink_mode(settings.sink_mode);
            run_request(settings, request).await
        }
        Commands::Init { output, force } => init_settings(&output, force).await,
        Commands::ShowConfig => {
            show_config(&settings);
            Ok(())
        }
    }
}

async fn run_judge(settings: RunnerSettings) -> Result<()> {
    let layout = JudgeLayout::new(&settings.base_dir);

    let problem = ProblemConfig::from_file(layout.problem_config_path())
        .context("failed to load problem config")?;
    let language = LanguageConfig::from_file(layout.language_config_path())
        .context("failed to load language config")?;

    info!(
        base_dir = %layout.base_dir().display(),
        phase = ?problem.phase(),
        "judging submission"
    );

    let runner = Runner::new(settings);
    let verdict = runner
        .judge(&layout, &problem, &language)
        .await
        .context("judge step failed")?;

    emit(&verdict)
}

async fn run_request(settings: RunnerSettings, request: RunRequest) -> Result<()> {
    info!(phase = ?request.phase, command = ?request.command_line, "running command");

    let runner = Runner::new(settings);
    let execution = runner
        .execute(&request)
        .await
        .context("failed to run command")?;

    emit(&execution.verdict)
}

/// Print the one verdict line
fn emit(verdict: &Verdict) -> Result<()> {
    let line = verdict
        .to_json_line()
        .context("failed to serialize verdict")?;
    println!("{line}");

    info!(
        success = verdict.is_success,
        timeout = verdict.is_timeout,
        spend_time = format_args!("{}ms", verdict.spend_time),
        "verdict emitted"
    );
    Ok(())
}

fn show_config(settings: &RunnerSettings) {
    let layout = JudgeLayout::new(&settings.base_dir);

    println!("Judge root: {}", layout.base_dir().display());
    println!("  Language config: {}", layout.language_config_path().display());
    println!("  Problem config: {}", layout.problem_config_path().display());
    println!("  Runtime dir: {}", layout.runtime_dir().display());
    println!();
    println!("Output limit: {} bytes", settings.output_limit);
    println!("Build time limit: {} ms", settings.build_time_limit_ms);
    println!("Sink mode: {:?}", settings.sink_mode);
    println!("Persist output: {}", settings.persist_output);
}

async fn init_settings(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Settings file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_SETTINGS)
        .await
        .context("failed to write settings file")?;

    println!("Created settings file at '{}'", output.display());
    Ok(())
}
