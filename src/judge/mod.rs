//! Compile-and-verify harness
//!
//! Builds each submission, runs it against the assignment's fixtures under
//! a wall-clock limit and assembles the per-student report.

pub mod compiler;
pub mod diff;
pub mod grader;
pub mod process;
pub mod report;
pub mod testcase;
pub mod timing;

pub use compiler::Compiler;
pub use grader::{GradeOptions, GradeSummary, Grader};
pub use process::ProcessRunner;
pub use report::Report;
pub use testcase::TestCaseRunner;
