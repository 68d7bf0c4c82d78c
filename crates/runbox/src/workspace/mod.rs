//! Judge directory layout
//!
//! The judge root is provisioned by the container image: a language config at
//! the top, the submission's files under `submission/`, and a `runtime/`
//! directory the child runs in. This module stages input into the runtime
//! directory and persists captured output back next to the submission.

use std::path::PathBuf;

use thiserror::Error;

pub use crate::workspace::layout::JudgeLayout;

mod layout;

/// Errors that occur while preparing or writing back the judge directories
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("submission input not found at {0}")]
    InputMissing(PathBuf),

    #[error("failed to inspect submission input {path}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare runtime directory {path}: {source}")]
    Prepare {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stage input into {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist output to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
