//! Plain data types produced and consumed by the grading harness.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One student's work for one assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Owning identity (unix account name)
    pub owner: String,
    /// Assignment identifier, e.g. `hw1`
    pub assignment: String,
    /// Directory holding the submitted files
    pub directory: PathBuf,
    /// Required source files, in required-file-list order
    pub sources: Vec<PathBuf>,
    /// Optional notes file
    pub notes: Option<PathBuf>,
}

/// Outcome of the build step for one submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub success: bool,
    /// Human-readable compiler output or synthesized status text
    pub message: String,
}

impl BuildResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Result of running a command under a wall-clock limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutput {
    /// Process exited; combined stdout and stderr
    Completed(String),
    /// Process was killed after exceeding the limit
    TimedOut,
}

impl RunOutput {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunOutput::TimedOut)
    }

    /// Captured text, or `None` for a timeout.
    pub fn text(&self) -> Option<&str> {
        match self {
            RunOutput::Completed(text) => Some(text),
            RunOutput::TimedOut => None,
        }
    }
}

/// Paired optional input and expected output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFixture {
    /// Input file base name, or the assignment id for the implicit fixture
    pub name: String,
    /// Redirected as standard input when present
    pub input: Option<PathBuf>,
    /// Reference output file
    pub expected: PathBuf,
}

/// Status of a single fixture run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeStatus {
    Timeout,
    Completed,
    /// The executable could not be started
    Failed,
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Timeout => write!(f, "TIMEOUT"),
            OutcomeStatus::Completed => write!(f, "COMPLETED"),
            OutcomeStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of running one fixture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub case_name: String,
    pub status: OutcomeStatus,
    /// Empty for timeouts; the launch error for failed runs
    pub captured: String,
    /// Unified diff lines, present only when diffing was requested and
    /// the run completed
    pub diff: Option<Vec<String>>,
}

impl TestOutcome {
    pub fn timed_out(case_name: impl Into<String>) -> Self {
        Self {
            case_name: case_name.into(),
            status: OutcomeStatus::Timeout,
            captured: String::new(),
            diff: None,
        }
    }

    pub fn completed(
        case_name: impl Into<String>,
        captured: String,
        diff: Option<Vec<String>>,
    ) -> Self {
        Self {
            case_name: case_name.into(),
            status: OutcomeStatus::Completed,
            captured,
            diff,
        }
    }

    pub fn failed(case_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            case_name: case_name.into(),
            status: OutcomeStatus::Failed,
            captured: error.into(),
            diff: None,
        }
    }

    /// True when a diff was computed and it is empty.
    pub fn matches_reference(&self) -> bool {
        self.diff.as_ref().is_some_and(|d| d.is_empty())
    }
}
