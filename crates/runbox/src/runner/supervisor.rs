//! Child process supervision
//!
//! Spawns the child, drains stdout and stderr concurrently into bounded
//! sinks and waits for exit, all under one deadline. The exit status is only
//! taken as final once every drain has seen end-of-stream.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::runner::RunnerError;
use crate::runner::deadline::{Deadline, ProcessGroup, Termination};
use crate::runner::sink::{BoundedSink, SinkMode};
use crate::types::{Phase, RunRequest};

/// How long drains get to observe end-of-stream after the group is killed
pub const DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK: usize = 8 * 1024;

/// Bytes captured from one stream (or the merged pair)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    /// Stored bytes; at most the cap unless the sink ran in passthrough mode
    pub bytes: Vec<u8>,

    /// Bytes the child wrote, stored or discarded
    pub bytes_written: u64,

    pub limit_exceeded: bool,
}

impl Capture {
    /// Lossy UTF-8 view of the stored bytes
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl From<BoundedSink<Vec<u8>>> for Capture {
    fn from(sink: BoundedSink<Vec<u8>>) -> Self {
        Self {
            bytes_written: sink.bytes_written(),
            limit_exceeded: sink.limit_exceeded(),
            bytes: sink.into_inner(),
        }
    }
}

/// Captured output, shaped by phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Streams {
    /// Run phase: one sink per stream
    Separate { stdout: Capture, stderr: Capture },

    /// Build phase: both streams merged into one sink in arrival order
    Combined(Capture),
}

impl Streams {
    /// Either stream went past its cap
    pub fn any_exceeded(&self) -> bool {
        match self {
            Streams::Separate { stdout, stderr } => stdout.limit_exceeded || stderr.limit_exceeded,
            Streams::Combined(capture) => capture.limit_exceeded,
        }
    }
}

/// Everything the supervisor observed about one child
#[derive(Debug, Clone)]
pub struct Observation {
    pub termination: Termination,
    pub streams: Streams,
}

/// Run one child to completion or deadline
#[instrument(skip(request), fields(phase = ?request.phase, program = ?request.command_line.first()))]
pub async fn supervise(request: &RunRequest) -> Result<Observation, RunnerError> {
    if !request.working_dir.is_dir() {
        return Err(RunnerError::WorkingDir(request.working_dir.clone()));
    }

    let mut child = spawn(request)?;
    let mut group = ProcessGroup::led_by(child.id());
    debug!(pgid = ?group.id(), "child started");

    let stdout = child
        .stdout
        .take()
        .ok_or(RunnerError::MissingPipe("stdout"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or(RunnerError::MissingPipe("stderr"))?;

    let mut drains = Drains::start(
        request.phase,
        stdout,
        stderr,
        request.output_limit,
        request.sink_mode,
    );

    let deadline = Deadline::new(request.time_limit);
    let finished = deadline
        .run(async {
            drains.finish().await;
            group.leader_exited().await.map_err(RunnerError::Wait)?;
            // Background descendants die with the group while the leader
            // still pins the pgid
            group.sweep();
            child.wait().await.map_err(RunnerError::Wait)
        })
        .await;

    let termination = match finished {
        Some(status) => Termination::Exited(status?),
        None => {
            group.sweep();
            reap(&mut child).await;
            if tokio::time::timeout(DRAIN_GRACE, drains.finish())
                .await
                .is_err()
            {
                warn!("output drains still open after kill, abandoning them");
            }
            Termination::Expired
        }
    };

    let streams = drains.into_streams()?;
    debug!(
        ?termination,
        output_exceeded = streams.any_exceeded(),
        "child finished"
    );

    Ok(Observation {
        termination,
        streams,
    })
}

/// Spawn the child with its stdio wired
///
/// The `Command` (and with it the parent's handle on the stdin file) is
/// dropped on return, so the child sees end-of-stream once it has read the
/// whole input.
fn spawn(request: &RunRequest) -> Result<Child, RunnerError> {
    let (program, args) = request
        .command_line
        .split_first()
        .ok_or(RunnerError::EmptyCommand)?;

    let stdin = match (request.phase, &request.stdin) {
        (Phase::Run, Some(path)) => {
            let file = std::fs::File::open(path).map_err(|source| RunnerError::Stdin {
                path: path.clone(),
                source,
            })?;
            Stdio::from(file)
        }
        _ => Stdio::null(),
    };

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(&request.working_dir)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    command.spawn().map_err(|source| RunnerError::Spawn {
        program: program.clone(),
        source,
    })
}

/// Reap a child that was just killed
async fn reap(child: &mut Child) {
    if let Err(e) = child.start_kill()
        && e.kind() != io::ErrorKind::InvalidInput
    {
        warn!(error = %e, "failed to kill child");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "failed to reap child");
    }
}

type DrainTask = JoinHandle<io::Result<Capture>>;

enum Slot {
    Pending(DrainTask),
    Done(io::Result<Capture>),
}

impl Slot {
    async fn finish(&mut self) {
        if let Slot::Pending(task) = self {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => Err(io::Error::other(e)),
            };
            *self = Slot::Done(result);
        }
    }

    fn into_capture(self) -> Result<Capture, RunnerError> {
        match self {
            Slot::Done(result) => result.map_err(RunnerError::Capture),
            // Only reachable after the grace period ran out
            Slot::Pending(task) => {
                task.abort();
                Ok(Capture::default())
            }
        }
    }
}

/// The drain tasks of one child
///
/// Results are parked in slots, so a `finish` cancelled by the deadline can be
/// resumed without losing a drain that already completed.
enum Drains {
    Separate { stdout: Slot, stderr: Slot },
    Combined(Slot),
}

impl Drains {
    fn start(
        phase: Phase,
        stdout: ChildStdout,
        stderr: ChildStderr,
        limit: u64,
        mode: SinkMode,
    ) -> Self {
        let sink = || BoundedSink::new(Vec::new(), limit, mode);
        match phase {
            Phase::Run => Drains::Separate {
                stdout: Slot::Pending(tokio::spawn(drain(stdout, sink()))),
                stderr: Slot::Pending(tokio::spawn(drain(stderr, sink()))),
            },
            Phase::Build => Drains::Combined(Slot::Pending(tokio::spawn(drain_merged(
                stdout,
                stderr,
                sink(),
            )))),
        }
    }

    async fn finish(&mut self) {
        match self {
            Drains::Separate { stdout, stderr } => {
                stdout.finish().await;
                stderr.finish().await;
            }
            Drains::Combined(slot) => slot.finish().await,
        }
    }

    fn into_streams(self) -> Result<Streams, RunnerError> {
        Ok(match self {
            Drains::Separate { stdout, stderr } => Streams::Separate {
                stdout: stdout.into_capture()?,
                stderr: stderr.into_capture()?,
            },
            Drains::Combined(slot) => Streams::Combined(slot.into_capture()?),
        })
    }
}

/// Copy one stream into its sink until end-of-stream
async fn drain<R>(mut reader: R, mut sink: BoundedSink<Vec<u8>>) -> io::Result<Capture>
where
    R: AsyncRead + Unpin,
{
    tokio::io::copy(&mut reader, &mut sink).await?;
    sink.flush().await?;
    Ok(sink.into())
}

/// Merge both streams into one sink, servicing whichever pipe is ready
async fn drain_merged(
    stdout: ChildStdout,
    stderr: ChildStderr,
    mut sink: BoundedSink<Vec<u8>>,
) -> io::Result<Capture> {
    let mut stdout = Some(stdout);
    let mut stderr = Some(stderr);
    let mut out_buf = vec![0u8; READ_CHUNK];
    let mut err_buf = vec![0u8; READ_CHUNK];

    while stdout.is_some() || stderr.is_some() {
        tokio::select! {
            read = read_some(&mut stdout, &mut out_buf), if stdout.is_some() => {
                match read? {
                    0 => stdout = None,
                    n => sink.write_all(&out_buf[..n]).await?,
                }
            }
            read = read_some(&mut stderr, &mut err_buf), if stderr.is_some() => {
                match read? {
                    0 => stderr = None,
                    n => sink.write_all(&err_buf[..n]).await?,
                }
            }
        }
    }

    sink.flush().await?;
    Ok(sink.into())
}

async fn read_some<R>(reader: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader {
        Some(reader) => reader.read(buf).await,
        None => std::future::pending().await,
    }
}
