use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::runner::{Capture, Streams};
use crate::workspace::WorkspaceError;

const SUBMISSION_DIR: &str = "submission";
const RUNTIME_DIR: &str = "runtime";
const LANGUAGE_CONFIG: &str = "language_config.json";
const PROBLEM_CONFIG: &str = "problem_config.json";
const INPUT_FILE: &str = "input.txt";
const STDOUT_FILE: &str = "out.txt";
const STDERR_FILE: &str = "err.txt";

/// Paths of one judge root
///
/// ```text
/// <base>/language_config.json
/// <base>/submission/problem_config.json
/// <base>/submission/input.txt
/// <base>/submission/out.txt      (written)
/// <base>/submission/err.txt      (written)
/// <base>/runtime/                (child's working directory)
/// <base>/runtime/input.txt       (staged copy)
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeLayout {
    base_dir: PathBuf,
}

impl JudgeLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn submission_dir(&self) -> PathBuf {
        self.base_dir.join(SUBMISSION_DIR)
    }

    /// Working directory of the child
    pub fn runtime_dir(&self) -> PathBuf {
        self.base_dir.join(RUNTIME_DIR)
    }

    pub fn language_config_path(&self) -> PathBuf {
        self.base_dir.join(LANGUAGE_CONFIG)
    }

    pub fn problem_config_path(&self) -> PathBuf {
        self.submission_dir().join(PROBLEM_CONFIG)
    }

    /// Submission input as provisioned
    pub fn input_path(&self) -> PathBuf {
        self.submission_dir().join(INPUT_FILE)
    }

    /// Input copy the child reads from
    pub fn staged_input_path(&self) -> PathBuf {
        self.runtime_dir().join(INPUT_FILE)
    }

    pub fn stdout_path(&self) -> PathBuf {
        self.submission_dir().join(STDOUT_FILE)
    }

    pub fn stderr_path(&self) -> PathBuf {
        self.submission_dir().join(STDERR_FILE)
    }

    /// Make sure the runtime directory exists
    ///
    /// Its contents are left alone: the build artifact (or interpreted
    /// source) is already there.
    #[instrument(skip(self))]
    pub async fn prepare_runtime(&self) -> Result<PathBuf, WorkspaceError> {
        let path = self.runtime_dir();
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| WorkspaceError::Prepare {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Copy the submission input into the runtime directory
    ///
    /// Returns the staged path. The copy is complete before the child starts.
    #[instrument(skip(self))]
    pub async fn stage_input(&self) -> Result<PathBuf, WorkspaceError> {
        let source = self.input_path();
        let exists = tokio::fs::try_exists(&source).await.map_err(|e| {
            WorkspaceError::InputUnreadable {
                path: source.clone(),
                source: e,
            }
        })?;
        if !exists {
            return Err(WorkspaceError::InputMissing(source));
        }

        self.prepare_runtime().await?;
        let target = self.staged_input_path();
        let len = tokio::fs::copy(&source, &target)
            .await
            .map_err(|e| WorkspaceError::Stage {
                path: target.clone(),
                source: e,
            })?;

        debug!(?target, len, "staged input");
        Ok(target)
    }

    /// Write captured run-phase output to `out.txt` / `err.txt`
    ///
    /// A combined build capture has no per-stream files and is skipped.
    #[instrument(skip(self, streams))]
    pub async fn persist_outputs(&self, streams: &Streams) -> Result<(), WorkspaceError> {
        let Streams::Separate { stdout, stderr } = streams else {
            return Ok(());
        };

        write_capture(&self.stdout_path(), stdout).await?;
        write_capture(&self.stderr_path(), stderr).await?;
        Ok(())
    }
}

async fn write_capture(path: &Path, capture: &Capture) -> Result<(), WorkspaceError> {
    tokio::fs::write(path, &capture.bytes)
        .await
        .map_err(|source| WorkspaceError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(?path, len = capture.bytes.len(), "persisted output");
    Ok(())
}
