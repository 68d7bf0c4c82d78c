use std::time::{Duration, Instant};

use runbox::{Outcome, RunRequest, execute};

use super::{run_request, sh};

const MIB: u64 = 1024 * 1024;

#[tokio::test]
async fn scenario_a_echo_hello() {
    let dir = tempfile::tempdir().unwrap();
    let request = RunRequest::run(vec!["echo".to_string(), "hello".to_string()], dir.path())
        .with_time_limit(Duration::from_millis(1000))
        .with_output_limit(MIB);

    let execution = execute(&request).await.expect("echo should run");
    let verdict = execution.verdict;

    assert!(verdict.is_success);
    assert!(!verdict.is_timeout);
    assert!(!verdict.compile_mode);
    assert_eq!(verdict.output, "hello\n");
}

#[tokio::test]
async fn scenario_b_sleep_past_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let request = run_request("sleep 5", dir.path()).with_time_limit(Duration::from_millis(200));

    let started = Instant::now();
    let verdict = execute(&request).await.unwrap().verdict;

    assert!(!verdict.is_success);
    assert!(verdict.is_timeout);
    assert_eq!(verdict.err, "Time Limit Exceeded");
    assert!(verdict.spend_time >= 200);
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn scenario_c_output_flood() {
    let dir = tempfile::tempdir().unwrap();
    let request = run_request("head -c 20971520 /dev/zero", dir.path())
        .with_time_limit(Duration::from_millis(5000))
        .with_output_limit(16 * MIB);

    let execution = execute(&request).await.unwrap();

    assert_eq!(execution.outcome, Outcome::OutputLimitExceeded);
    assert!(!execution.verdict.is_success);
    assert!(!execution.verdict.is_timeout);
    assert_eq!(execution.verdict.err, "Output Limit Exceeded");
}

#[tokio::test]
async fn scenario_d_failing_build() {
    let dir = tempfile::tempdir().unwrap();
    let request = RunRequest::build(sh("printf 'syntax error' >&2; exit 1"), dir.path());

    let verdict = execute(&request).await.unwrap().verdict;

    assert!(verdict.compile_mode);
    assert!(!verdict.is_success);
    assert!(!verdict.is_timeout);
    assert_eq!(verdict.err, "syntax error");
}

#[tokio::test]
async fn build_timeout_reports_time_limit() {
    let dir = tempfile::tempdir().unwrap();
    let request = RunRequest::build(sh("sleep 5"), dir.path())
        .with_time_limit(Duration::from_millis(200));

    let verdict = execute(&request).await.unwrap().verdict;

    assert!(verdict.compile_mode);
    assert!(verdict.is_timeout);
    assert_eq!(verdict.err, "Time Limit Exceeded");
}

#[tokio::test]
async fn flood_that_outlives_deadline_is_a_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let request = run_request("while :; do head -c 65536 /dev/zero; done", dir.path())
        .with_time_limit(Duration::from_millis(300))
        .with_output_limit(1024);

    let execution = execute(&request).await.unwrap();
    assert_eq!(execution.outcome, Outcome::TimeLimitExceeded);
    assert_eq!(execution.verdict.err, "Time Limit Exceeded");
}

#[tokio::test]
async fn runtime_error_carries_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let request = run_request("echo partial; echo 'division by zero' >&2; exit 2", dir.path());

    let verdict = execute(&request).await.unwrap().verdict;

    assert!(!verdict.is_success);
    assert!(!verdict.is_timeout);
    assert_eq!(verdict.output, "partial\n");
    assert_eq!(verdict.err, "division by zero\n");
}

#[tokio::test]
async fn identical_requests_give_identical_verdicts() {
    let dir = tempfile::tempdir().unwrap();
    let request = run_request("echo same; echo also >&2; exit 1", dir.path());

    let mut first = execute(&request).await.unwrap().verdict;
    let mut second = execute(&request).await.unwrap().verdict;
    first.spend_time = 0;
    second.spend_time = 0;

    assert_eq!(first, second);
}
