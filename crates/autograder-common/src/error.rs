//! Error taxonomy for the grading harness.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type used across the harness.
///
/// Per-submission variants (`MissingSubmissionFiles`, `BuildFailure`,
/// `ExecutionTimeout`) are recorded into that submission's report; the
/// remaining variants describe setup problems that affect every submission.
#[derive(Error, Debug)]
pub enum GradeError {
    /// One or more required source files are absent
    #[error("Missing submission files: {}", display_paths(.0))]
    MissingSubmissionFiles(Vec<PathBuf>),

    /// The build step reported a compiler error
    #[error("Build failed: {0}")]
    BuildFailure(String),

    /// A child process exceeded its wall-clock limit
    #[error("Execution timed out: {0}")]
    ExecutionTimeout(String),

    /// A fixture has no reference output file
    #[error("Missing reference output: {}", .0.display())]
    MissingReferenceOutput(PathBuf),

    /// File I/O error
    #[error("File error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The command could not be started
    #[error("Failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Command string had no tokens
    #[error("Empty command")]
    EmptyCommand,

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Roster could not be read or parsed
    #[error("Roster error: {0}")]
    Roster(String),
}

impl GradeError {
    /// Wrap an I/O error with the path it concerns.
    pub fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GradeError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Returns the error code string for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            GradeError::MissingSubmissionFiles(_) => "MISSING_SUBMISSION_FILES",
            GradeError::BuildFailure(_) => "BUILD_FAILURE",
            GradeError::ExecutionTimeout(_) => "EXECUTION_TIMEOUT",
            GradeError::MissingReferenceOutput(_) => "MISSING_REFERENCE_OUTPUT",
            GradeError::Filesystem { .. } => "FILESYSTEM_ERROR",
            GradeError::Launch { .. } => "LAUNCH_ERROR",
            GradeError::EmptyCommand => "EMPTY_COMMAND",
            GradeError::Config(_) => "CONFIGURATION_ERROR",
            GradeError::Roster(_) => "ROSTER_ERROR",
        }
    }

    /// Whether the error only concerns a single submission.
    ///
    /// Anything else indicates a setup problem and should stop the run.
    pub fn is_per_submission(&self) -> bool {
        matches!(
            self,
            GradeError::MissingSubmissionFiles(_)
                | GradeError::BuildFailure(_)
                | GradeError::ExecutionTimeout(_)
        )
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using GradeError
pub type GradeResult<T> = Result<T, GradeError>;
