//! Autograder - compile-and-verify harness for student programs
//!
//! Builds each student's submission for an assignment, runs the executable
//! against the assignment's input fixtures under a wall-clock limit and
//! writes one plain-text report per student.
//!
//! # Architecture
//!
//! - **Judge**: process runner, build step, timing check, fixture runner,
//!   diff and report assembly, tied together by the grader
//! - **Services**: grade notifications and status reports
//! - **Models**: the course roster
//!
//! Plain data types and the error taxonomy live in `autograder-common`.

pub mod cli;
pub mod config;
pub mod constants;
pub mod judge;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use autograder_common::{GradeError, GradeResult};
pub use config::Config;
