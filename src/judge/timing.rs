//! Submission timing: compare each file's modification time with the
//! assignment deadline.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, TimeZone};

use autograder_common::GradeResult;

use crate::constants::{LATE_GRACE_SECS, LATE_MARKER};
use crate::utils::{base_name, format_timestamp, modified_time};

/// Whether a file submitted at `submitted` is late.
///
/// Up to [`LATE_GRACE_SECS`] past the deadline still counts as on time.
pub fn is_late<Tz: TimeZone>(submitted: &DateTime<Tz>, deadline: &DateTime<FixedOffset>) -> bool {
    submitted.timestamp() - deadline.timestamp() > LATE_GRACE_SECS
}

/// Annotation lines for one file.
pub fn annotate<Tz: TimeZone>(
    assignment: &str,
    file_name: &str,
    submitted: &DateTime<Tz>,
    deadline: &DateTime<FixedOffset>,
) -> Vec<String> {
    let offset = deadline.offset();
    let mut lines = vec![
        format!("{} ({} deadline)", format_timestamp(deadline, offset), assignment),
        format!(
            "{} ({} submission time)",
            format_timestamp(submitted, offset),
            file_name
        ),
    ];
    if is_late(submitted, deadline) {
        lines.push(LATE_MARKER.to_string());
    }
    lines
}

/// Annotation lines for every file, in order.
///
/// Times are shown in the deadline's offset.
pub async fn check_submission_time(
    assignment: &str,
    files: &[PathBuf],
    deadline: &DateTime<FixedOffset>,
) -> GradeResult<Vec<String>> {
    let mut lines = Vec::with_capacity(files.len() * 3);
    for file in files {
        let submitted = modified_time(file).await?;
        let annotation = annotate(assignment, &base_name(file), &submitted, deadline);
        if annotation.len() > 2 {
            tracing::info!(file = %file.display(), "Late submission");
        }
        lines.extend(annotation);
    }
    Ok(lines)
}
