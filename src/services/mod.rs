//! Services built on top of the grading harness

pub mod notify_service;
pub mod status_service;

pub use notify_service::NotifyService;
pub use status_service::{ItemCounts, StatusService, StudentStatus};
