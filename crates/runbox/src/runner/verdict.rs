//! Verdict resolution
//!
//! Outcomes are decided by an ordered rule table, first match wins:
//!
//! 1. deadline expired → time limit exceeded
//! 2. either sink over its cap → output limit exceeded
//! 3. failure exit status → failed
//! 4. otherwise → succeeded
//!
//! A killed child may also report a failure status, so expiry must be
//! checked before the exit status is looked at.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::runner::supervisor::{Observation, Streams};
use crate::types::{Phase, Verdict};

/// Reason literal for a deadline expiry
pub const TIME_LIMIT_EXCEEDED: &str = "Time Limit Exceeded";

/// Reason literal for an output overflow
pub const OUTPUT_LIMIT_EXCEEDED: &str = "Output Limit Exceeded";

/// Signals the resolver decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signals {
    pub expired: bool,
    pub output_exceeded: bool,
    pub exit_success: bool,
}

impl From<&Observation> for Signals {
    fn from(observation: &Observation) -> Self {
        Self {
            expired: observation.termination.is_expired(),
            output_exceeded: observation.streams.any_exceeded(),
            exit_success: observation.termination.exit_success(),
        }
    }
}

/// What the invocation amounted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "TLE")]
    TimeLimitExceeded,

    #[serde(rename = "OLE")]
    OutputLimitExceeded,

    #[serde(rename = "FAIL")]
    Failed,

    #[serde(rename = "OK")]
    Succeeded,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }

    /// Fixed reason string, if this outcome has one
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Outcome::TimeLimitExceeded => Some(TIME_LIMIT_EXCEEDED),
            Outcome::OutputLimitExceeded => Some(OUTPUT_LIMIT_EXCEEDED),
            Outcome::Failed | Outcome::Succeeded => None,
        }
    }
}

struct Rule {
    applies: fn(&Signals) -> bool,
    outcome: Outcome,
}

fn deadline_expired(signals: &Signals) -> bool {
    signals.expired
}

fn output_exceeded(signals: &Signals) -> bool {
    signals.output_exceeded
}

fn exit_failed(signals: &Signals) -> bool {
    !signals.exit_success
}

fn always(_: &Signals) -> bool {
    true
}

/// Priority order. Earlier rules win even if a later one also holds.
const RULES: [Rule; 4] = [
    Rule {
        applies: deadline_expired,
        outcome: Outcome::TimeLimitExceeded,
    },
    Rule {
        applies: output_exceeded,
        outcome: Outcome::OutputLimitExceeded,
    },
    Rule {
        applies: exit_failed,
        outcome: Outcome::Failed,
    },
    Rule {
        applies: always,
        outcome: Outcome::Succeeded,
    },
];

/// Pick the outcome for a set of signals
pub fn resolve(signals: &Signals) -> Outcome {
    RULES
        .iter()
        .find(|rule| (rule.applies)(signals))
        .map_or(Outcome::Succeeded, |rule| rule.outcome)
}

/// Build the verdict record for a resolved outcome
///
/// Limit outcomes carry only their reason literal. Otherwise the run phase
/// reports stdout as `output` and stderr as `err`; the build phase reports
/// its combined output as `output` on success and as `err` on failure.
pub fn assemble(phase: Phase, outcome: Outcome, streams: &Streams, elapsed: Duration) -> Verdict {
    let (output, err) = match (outcome.reason(), streams) {
        (Some(reason), _) => (String::new(), reason.to_string()),
        (None, Streams::Separate { stdout, stderr }) => (stdout.text(), stderr.text()),
        (None, Streams::Combined(capture)) if outcome.is_success() => {
            (capture.text(), String::new())
        }
        (None, Streams::Combined(capture)) => (String::new(), capture.text()),
    };

    Verdict {
        compile_mode: phase.is_build(),
        is_success: outcome.is_success(),
        output,
        err,
        is_timeout: matches!(outcome, Outcome::TimeLimitExceeded),
        spend_time: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}
