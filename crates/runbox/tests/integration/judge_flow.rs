use runbox::{JudgeLayout, LanguageConfig, ProblemConfig, Runner, RunnerSettings};

/// Judge root with a shell "language": the build copies the source to
/// `prog`, the run executes it.
fn judge_root(source: &str, input: &str, problem_json: &str) -> (tempfile::TempDir, JudgeLayout) {
    let dir = tempfile::tempdir().unwrap();
    let layout = JudgeLayout::new(dir.path());

    std::fs::create_dir_all(layout.submission_dir()).unwrap();
    std::fs::create_dir_all(layout.runtime_dir()).unwrap();
    std::fs::write(layout.runtime_dir().join("main.sh"), source).unwrap();
    std::fs::write(layout.input_path(), input).unwrap();
    std::fs::write(layout.problem_config_path(), problem_json).unwrap();
    std::fs::write(
        layout.language_config_path(),
        r#"{
            "run_command": ["/bin/sh", "prog"],
            "filename": "main.sh",
            "is_interpreter": false,
            "build_command": ["/bin/sh", "-c", "cp {filename} prog && echo compiled"]
        }"#,
    )
    .unwrap();

    (dir, layout)
}

async fn judge(layout: &JudgeLayout) -> runbox::Verdict {
    let problem = ProblemConfig::from_file(layout.problem_config_path()).unwrap();
    let language = LanguageConfig::from_file(layout.language_config_path()).unwrap();
    Runner::new(RunnerSettings::default())
        .judge(layout, &problem, &language)
        .await
        .unwrap()
}

#[tokio::test]
async fn build_then_run() {
    let (_dir, layout) = judge_root(
        "read n; echo $((n * 2))",
        "21\n",
        r#"{ "timeout": 2000, "memory_limit": 256, "is_build": true }"#,
    );

    let build = judge(&layout).await;
    assert!(build.compile_mode);
    assert!(build.is_success);
    assert_eq!(build.output, "compiled\n");

    std::fs::write(
        layout.problem_config_path(),
        r#"{ "timeout": 2000, "memory_limit": 256, "is_build": false }"#,
    )
    .unwrap();

    let run = judge(&layout).await;
    assert!(!run.compile_mode);
    assert!(run.is_success);
    assert_eq!(run.output, "42\n");
    assert_eq!(std::fs::read_to_string(layout.stdout_path()).unwrap(), "42\n");
    assert!(layout.staged_input_path().exists());
}

#[tokio::test]
async fn run_phase_timeout_from_problem_config() {
    let (_dir, layout) = judge_root(
        "",
        "",
        r#"{ "timeout": 150, "is_build": false }"#,
    );
    std::fs::write(layout.runtime_dir().join("prog"), "sleep 5").unwrap();

    let verdict = judge(&layout).await;
    assert!(verdict.is_timeout);
    assert_eq!(verdict.err, "Time Limit Exceeded");
}

#[tokio::test]
async fn problem_output_limit_overrides_default() {
    let (_dir, layout) = judge_root(
        "",
        "",
        r#"{ "timeout": 2000, "is_build": false, "output_limit": 8 }"#,
    );
    std::fs::write(layout.runtime_dir().join("prog"), "echo 0123456789").unwrap();

    let verdict = judge(&layout).await;
    assert!(!verdict.is_success);
    assert_eq!(verdict.err, "Output Limit Exceeded");
    // Truncating sink keeps the cap's worth on disk
    assert_eq!(std::fs::read(layout.stdout_path()).unwrap(), b"01234567");
}

#[tokio::test]
async fn missing_problem_config_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let layout = JudgeLayout::new(dir.path());
    assert!(ProblemConfig::from_file(layout.problem_config_path()).is_err());
}
