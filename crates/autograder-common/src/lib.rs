//! Common types and errors shared by the autograder harness.

pub mod error;
pub mod types;

pub use error::{GradeError, GradeResult};
pub use types::*;
