//! Application configuration management
//!
//! Configuration is loaded from environment variables (with `.env` support)
//! once at startup and then passed explicitly into each component, so tests
//! can build a `Config` around temporary directories and synthetic
//! deadlines.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::constants::{
    layout, DEFAULT_COMPILER, DEFAULT_COMPILE_TIMEOUT_SECS, DEFAULT_RUN_TIMEOUT_SECS,
    EXECUTABLE_NAME,
};

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub paths: PathsConfig,
    pub grading: GradingConfig,
    pub course: CourseConfig,
}

/// Filesystem layout consumed and produced by the harness
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Root holding one directory per student
    pub course_dir: PathBuf,
    /// JSON roster
    pub roster_path: PathBuf,
    /// Grading criteria, required-file lists, fixtures, alternate mains
    pub support_dir: PathBuf,
    /// Report output root
    pub results_dir: PathBuf,
}

/// Limits and build settings
#[derive(Debug, Clone)]
pub struct GradingConfig {
    /// Submission deadline; its offset is also the display timezone
    pub deadline: Option<DateTime<FixedOffset>>,
    pub run_timeout: Duration,
    pub compile_timeout: Duration,
    /// Compiler command, whitespace tokenized
    pub compiler: String,
}

/// Course details used in notifications
#[derive(Debug, Clone)]
pub struct CourseConfig {
    pub name: String,
    pub grader_email: String,
    pub email_domain: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            paths: PathsConfig::from_env()?,
            grading: GradingConfig::from_env()?,
            course: CourseConfig::from_env(),
        })
    }

    /// The deadline, required when grading.
    pub fn deadline(&self) -> Result<DateTime<FixedOffset>, ConfigError> {
        self.grading
            .deadline
            .ok_or_else(|| ConfigError::Missing("GRADER_DEADLINE".to_string()))
    }
}

impl PathsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            course_dir: required_path("GRADER_COURSE_DIR")?,
            roster_path: required_path("GRADER_ROSTER_PATH")?,
            support_dir: PathBuf::from(
                env::var("GRADER_SUPPORT_DIR").unwrap_or_else(|_| "support_files".to_string()),
            ),
            results_dir: PathBuf::from(
                env::var("GRADER_RESULTS_DIR").unwrap_or_else(|_| "results".to_string()),
            ),
        })
    }

    /// `<support>/grading_criteria/<hw>_gc.txt`
    pub fn grading_criteria(&self, assignment: &str) -> PathBuf {
        self.support_dir
            .join(layout::GRADING_CRITERIA_DIR)
            .join(format!("{}{}", assignment, layout::GRADING_CRITERIA_SUFFIX))
    }

    /// `<support>/required_files/<hw>_rf.txt`
    pub fn required_files(&self, assignment: &str) -> PathBuf {
        self.support_dir
            .join(layout::REQUIRED_FILES_DIR)
            .join(format!("{}{}", assignment, layout::REQUIRED_FILES_SUFFIX))
    }

    /// `<support>/alt_main/<hw>_am.c`
    pub fn alt_main(&self, assignment: &str) -> PathBuf {
        self.support_dir
            .join(layout::ALT_MAIN_DIR)
            .join(format!("{}{}", assignment, layout::ALT_MAIN_SUFFIX))
    }

    /// `<support>/test_files/<hw>/input`
    pub fn input_fixtures(&self, assignment: &str) -> PathBuf {
        self.test_files(assignment).join(layout::INPUT_DIR)
    }

    /// `<support>/test_files/<hw>/output`
    pub fn output_fixtures(&self, assignment: &str) -> PathBuf {
        self.test_files(assignment).join(layout::OUTPUT_DIR)
    }

    fn test_files(&self, assignment: &str) -> PathBuf {
        self.support_dir.join(layout::TEST_FILES_DIR).join(assignment)
    }

    /// `<results>/<hw>_results`
    pub fn assignment_results(&self, assignment: &str) -> PathBuf {
        self.results_dir
            .join(format!("{}{}", assignment, layout::RESULTS_SUFFIX))
    }

    /// Report file for one student
    pub fn report_file(&self, assignment: &str, student: &str) -> PathBuf {
        self.assignment_results(assignment).join(student)
    }

    /// `<results>/<hw>_results/student_files`
    pub fn student_files(&self, assignment: &str) -> PathBuf {
        self.assignment_results(assignment)
            .join(layout::STUDENT_FILES_DIR)
    }

    /// Working directory owned by one student's run
    pub fn work_dir(&self, assignment: &str, student: &str) -> PathBuf {
        self.student_files(assignment).join(student)
    }

    /// Executable produced for one student
    pub fn executable(&self, assignment: &str, student: &str) -> PathBuf {
        self.work_dir(assignment, student).join(EXECUTABLE_NAME)
    }

    /// `<results>/status<mm-dd-yy>`
    pub fn status_dir(&self, stamp: &str) -> PathBuf {
        self.results_dir.join(format!("status{}", stamp))
    }

    /// `<course>/<student>`
    pub fn student_dir(&self, student: &str) -> PathBuf {
        self.course_dir.join(student)
    }

    /// `<course>/<student>/<hw>`
    pub fn submission_dir(&self, student: &str, assignment: &str) -> PathBuf {
        self.student_dir(student).join(assignment)
    }
}

impl GradingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let deadline = match env::var("GRADER_DEADLINE") {
            Ok(raw) => Some(parse_deadline(&raw)?),
            Err(_) => None,
        };

        Ok(Self {
            deadline,
            run_timeout: Duration::from_secs(parse_secs(
                "GRADER_RUN_TIMEOUT_SECS",
                DEFAULT_RUN_TIMEOUT_SECS,
            )?),
            compile_timeout: Duration::from_secs(parse_secs(
                "GRADER_COMPILE_TIMEOUT_SECS",
                DEFAULT_COMPILE_TIMEOUT_SECS,
            )?),
            compiler: env::var("GRADER_COMPILER").unwrap_or_else(|_| DEFAULT_COMPILER.to_string()),
        })
    }
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            deadline: None,
            run_timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
            compile_timeout: Duration::from_secs(DEFAULT_COMPILE_TIMEOUT_SECS),
            compiler: DEFAULT_COMPILER.to_string(),
        }
    }
}

impl CourseConfig {
    fn from_env() -> Self {
        Self {
            name: env::var("GRADER_COURSE_NAME").unwrap_or_default(),
            grader_email: env::var("GRADER_EMAIL").unwrap_or_default(),
            email_domain: env::var("GRADER_EMAIL_DOMAIN")
                .unwrap_or_else(|_| "cs.umb.edu".to_string()),
        }
    }
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            grader_email: String::new(),
            email_domain: "cs.umb.edu".to_string(),
        }
    }
}

/// Parse an RFC 3339 deadline, keeping its offset.
pub fn parse_deadline(raw: &str) -> Result<DateTime<FixedOffset>, ConfigError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map_err(|_| ConfigError::InvalidValue("GRADER_DEADLINE".to_string()))
}

fn required_path(key: &str) -> Result<PathBuf, ConfigError> {
    env::var(key)
        .map(PathBuf::from)
        .map_err(|_| ConfigError::Missing(key.to_string()))
}

fn parse_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    let secs: u64 = env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue(key.to_string()));
    }
    Ok(secs)
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(String),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for autograder_common::GradeError {
    fn from(err: ConfigError) -> Self {
        autograder_common::GradeError::Config(err.to_string())
    }
}
