//! Utility functions

pub mod fs;
pub mod time;

pub use fs::{base_name, missing_files, read_text, recreate_dir};
pub use time::{format_timestamp, modified_time, today_stamp};
