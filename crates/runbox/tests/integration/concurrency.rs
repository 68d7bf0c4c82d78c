use std::time::{Duration, Instant};

use runbox::{Outcome, Streams, execute};

use super::run_request;

#[tokio::test]
async fn stderr_flood_before_reading_stdin_does_not_deadlock() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    std::fs::write(&input, "ping\n").unwrap();

    let limit = Duration::from_secs(5);
    let request = run_request(
        "head -c 131072 /dev/zero >&2; cat; head -c 2097152 /dev/zero",
        dir.path(),
    )
    .with_stdin(&input)
    .with_time_limit(limit);

    let started = Instant::now();
    let execution = execute(&request).await.unwrap();

    assert_eq!(execution.outcome, Outcome::Succeeded);
    assert!(started.elapsed() < limit);

    match execution.streams {
        Streams::Separate { stdout, stderr } => {
            assert_eq!(stdout.bytes_written, 5 + 2_097_152);
            assert!(stdout.bytes.starts_with(b"ping\n"));
            assert_eq!(stderr.bytes_written, 131_072);
        }
        Streams::Combined(_) => panic!("run phase should keep streams apart"),
    }
}

#[tokio::test]
async fn interleaved_writers_keep_per_stream_order() {
    let dir = tempfile::tempdir().unwrap();
    let request = run_request(
        "for i in 1 2 3 4 5; do echo out$i; echo err$i >&2; done",
        dir.path(),
    );

    let execution = execute(&request).await.unwrap();
    assert_eq!(execution.verdict.output, "out1\nout2\nout3\nout4\nout5\n");
    assert_eq!(execution.verdict.err, "err1\nerr2\nerr3\nerr4\nerr5\n");
}

#[tokio::test]
async fn child_waiting_on_stdin_sees_end_of_stream() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.txt");
    std::fs::write(&input, "only line\n").unwrap();

    let request = run_request("cat; cat; echo done", dir.path())
        .with_stdin(&input)
        .with_time_limit(Duration::from_secs(3));

    let execution = execute(&request).await.unwrap();
    assert_eq!(execution.outcome, Outcome::Succeeded);
    assert_eq!(execution.verdict.output, "only line\ndone\n");
}
