//! Application-wide constants
//!
//! Fixed strings of the report format and default limits. The report
//! strings are read verbatim by downstream consumers, so they must stay
//! byte-stable.

// =============================================================================
// REPORT FORMAT
// =============================================================================

/// Separator written after every report block
pub const DIVIDER: &str =
    "\n--------------------------------------------------------------------------------\n\n";

/// Written in place of output when a fixture run exceeds its limit
pub const TIMEOUT_MSG: &str =
    "Execution timed out. The most common reason for this is an infinite loop.\n";

/// Precedes the launch error when a fixture run could not be started
pub const EXECUTION_FAILED_PREFIX: &str = "Execution failed: ";

/// Precedes the error that cut a submission's grading short
pub const GRADING_STOPPED_PREFIX: &str = "Grading stopped: ";

/// Written when a submission directory or required file is absent
pub const MISSING_MSG: &str = "Homework file/directory not found.\n  \
If you completed this homework, contact instructor.\n  \
DO NOT modify your hw directory in any way, as this will mark it as late.\n\n";

/// Marker appended to a timing annotation past the late window
pub const LATE_MARKER: &str = "LATE SUBMISSION.";

/// Labels of the two sides of a fixture diff
pub const DIFF_FROM_LABEL: &str = "Student Output";
pub const DIFF_TO_LABEL: &str = "Reference Output";

/// Lines of context around each diff hunk
pub const DIFF_CONTEXT_LINES: usize = 3;

/// `month-day-year hour:minute`
pub const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M";

// =============================================================================
// LIMITS
// =============================================================================

/// Default wall-clock limit for a fixture run in seconds
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 5;

/// Default wall-clock limit for the build step in seconds
pub const DEFAULT_COMPILE_TIMEOUT_SECS: u64 = 5;

/// Grace window absorbing filesystem and clock skew, in seconds
pub const LATE_GRACE_SECS: i64 = 500;

// =============================================================================
// BUILD
// =============================================================================

/// Default compiler command
pub const DEFAULT_COMPILER: &str = "gcc";

/// Substring of compiler output that marks a failed build
pub const COMPILER_ERROR_MARKER: &str = "error";

/// Name of the executable produced for every submission
pub const EXECUTABLE_NAME: &str = "main";

/// Notes file looked up in the submission directory
pub const NOTES_FILE_NAME: &str = "notes.txt";

// =============================================================================
// SUPPORT FILE LAYOUT
// =============================================================================

pub mod layout {
    pub const GRADING_CRITERIA_DIR: &str = "grading_criteria";
    pub const REQUIRED_FILES_DIR: &str = "required_files";
    pub const TEST_FILES_DIR: &str = "test_files";
    pub const ALT_MAIN_DIR: &str = "alt_main";
    pub const INPUT_DIR: &str = "input";
    pub const OUTPUT_DIR: &str = "output";
    pub const STUDENT_FILES_DIR: &str = "student_files";

    pub const GRADING_CRITERIA_SUFFIX: &str = "_gc.txt";
    pub const REQUIRED_FILES_SUFFIX: &str = "_rf.txt";
    pub const ALT_MAIN_SUFFIX: &str = "_am.c";
    pub const RESULTS_SUFFIX: &str = "_results";
}

// =============================================================================
// ROSTER
// =============================================================================

/// Roster record holding the maximum score of every item
pub const MAX_SCORE_RECORD: &str = "max_score";

/// Name of the ranking file written by the status report
pub const FINAL_REPORT_FILE: &str = "final_report.txt";
