//! Integration tests for runbox
//!
//! These drive real child processes through `/bin/sh`, so they need a Unix
//! host with the usual coreutils (`head`, `sleep`, `cat`).

use std::path::Path;
use std::time::Duration;

use runbox::RunRequest;

mod concurrency;
mod judge_flow;
mod scenarios;

/// Command line running `script` under `/bin/sh -c`
pub(crate) fn sh(script: &str) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
}

/// Run-phase request for `script` with an ample deadline
pub(crate) fn run_request(script: &str, dir: &Path) -> RunRequest {
    RunRequest::run(sh(script), dir).with_time_limit(Duration::from_secs(10))
}
