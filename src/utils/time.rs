//! Time utilities

use std::path::Path;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use autograder_common::{GradeError, GradeResult};

use crate::constants::TIMESTAMP_FORMAT;

/// Last-modification time of a file, truncated to whole seconds.
pub async fn modified_time(path: &Path) -> GradeResult<DateTime<Utc>> {
    let modified = tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .map_err(|e| GradeError::fs(path, e))?;
    let stamp: DateTime<Utc> = modified.into();
    Ok(Utc
        .timestamp_opt(stamp.timestamp(), 0)
        .single()
        .unwrap_or(stamp))
}

/// Format a timestamp as `month-day-year hour:minute` in the given offset.
pub fn format_timestamp<Tz: TimeZone>(time: &DateTime<Tz>, offset: &FixedOffset) -> String {
    time.with_timezone(offset)
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Current local date as `mm-dd-yy`, used to name status directories.
pub fn today_stamp() -> String {
    chrono::Local::now().format("%m-%d-%y").to_string()
}
