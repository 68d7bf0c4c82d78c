//! Wall-clock deadline for a supervised child
//!
//! The deadline wraps the whole supervision (both drains and the wait for
//! exit), so a child whose descendants keep a pipe open is still bounded.

use std::future::Future;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tracing::{debug, warn};

/// How the supervised work ended. Exactly one variant per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The child exited on its own before the deadline
    Exited(ExitStatus),

    /// The deadline fired and the process group was killed
    Expired,
}

impl Termination {
    pub fn is_expired(&self) -> bool {
        matches!(self, Termination::Expired)
    }

    /// True only for a natural exit with a success status
    pub fn exit_success(&self) -> bool {
        match self {
            Termination::Exited(status) => status.success(),
            Termination::Expired => false,
        }
    }
}

/// A cancellable wall-clock limit
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Drive `work` until it completes or the limit elapses
    ///
    /// Returns `None` on expiry. `work` is dropped at that point, so anything
    /// it borrowed is free for the caller's cleanup path.
    pub async fn run<F: Future>(&self, work: F) -> Option<F::Output> {
        match tokio::time::timeout(self.limit, work).await {
            Ok(output) => Some(output),
            Err(_) => {
                debug!(limit_ms = self.limit.as_millis() as u64, "deadline expired");
                None
            }
        }
    }
}

/// Process group of a spawned child
///
/// The child is spawned as the leader of its own group, so the group id is
/// its pid. Dropping the handle kills whatever is left of the group; this
/// runs on every exit route of the supervisor.
///
/// Once the leader is reaped and the last member is gone, the kernel may hand
/// the pgid to an unrelated group. A group kill is therefore only safe while
/// the leader is unreaped. Callers that reap the leader themselves use
/// [`ProcessGroup::sweep`] first, which kills the group and disarms the drop.
#[derive(Debug)]
pub struct ProcessGroup {
    pgid: Option<libc::pid_t>,
}

impl ProcessGroup {
    /// Track the group led by `pid`. `None` means the child is already reaped.
    pub fn led_by(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|pid| libc::pid_t::try_from(pid).ok()),
        }
    }

    pub fn id(&self) -> Option<libc::pid_t> {
        self.pgid
    }

    /// Send SIGKILL to every process in the group
    pub fn kill(&self) {
        let Some(pgid) = self.pgid else {
            return;
        };

        // SAFETY: killpg has no memory-safety preconditions
        let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
        if rc == -1 {
            let err = io::Error::last_os_error();
            // ESRCH: the group is already gone
            if err.raw_os_error() != Some(libc::ESRCH) {
                warn!(pgid, error = %err, "failed to kill process group");
            }
        } else {
            debug!(pgid, "killed process group");
        }
    }

    /// Kill the group and forget it, so nothing is signalled after the
    /// leader is reaped
    pub fn sweep(&mut self) {
        self.kill();
        self.pgid = None;
    }

    /// Wait until the leader has exited without reaping it
    ///
    /// The leader stays a zombie afterwards, which pins its pid and with it
    /// the pgid, so a following [`ProcessGroup::sweep`] cannot reach a
    /// recycled group.
    pub async fn leader_exited(&self) -> io::Result<()> {
        let Some(pgid) = self.pgid else {
            return Ok(());
        };
        tokio::task::spawn_blocking(move || wait_unreaped(pgid))
            .await
            .map_err(io::Error::other)?
    }
}

/// `waitid(WNOWAIT)` on one pid, retrying on EINTR
fn wait_unreaped(pid: libc::pid_t) -> io::Result<()> {
    let id = libc::id_t::try_from(pid)
        .map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?;
    loop {
        // SAFETY: siginfo_t is plain data and all-zero is a valid value
        let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
        // SAFETY: `info` is a live, writable siginfo_t for the whole call
        let rc =
            unsafe { libc::waitid(libc::P_PID, id, &mut info, libc::WEXITED | libc::WNOWAIT) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => continue,
            // Already reaped elsewhere
            Some(libc::ECHILD) => return Ok(()),
            _ => return Err(err),
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}
