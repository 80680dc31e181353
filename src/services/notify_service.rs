//! Grade notification messages
//!
//! One message per student, carrying the persisted report verbatim. Messages
//! are written to a caller-supplied sink; delivery is left to whatever reads
//! that sink.

use std::io::Write;

use autograder_common::{GradeError, GradeResult};

use crate::config::Config;
use crate::constants::{DIVIDER, MISSING_MSG};

pub struct NotifyService;

impl NotifyService {
    /// `<student>@<domain>`
    pub fn student_address(config: &Config, student: &str) -> String {
        format!("{}@{}", student, config.course.email_domain)
    }

    /// The persisted report for `student`, or the missing message when no
    /// report file exists.
    pub async fn report_text(config: &Config, assignment: &str, student: &str) -> String {
        let path = config.paths.report_file(assignment, student);
        match tokio::fs::read(&path).await {
            Ok(bytes) => format!("{}\n", String::from_utf8_lossy(&bytes)),
            Err(e) => {
                tracing::warn!(
                    student = %student,
                    path = %path.display(),
                    error = %e,
                    "Report not found, sending missing file message"
                );
                MISSING_MSG.to_string()
            }
        }
    }

    /// Full message with headers for one student.
    pub fn build_message(config: &Config, assignment: &str, student: &str, report: &str) -> String {
        let address = Self::student_address(config, student);
        let course = &config.course.name;

        let mut body = format!(
            "Sent to: {}\nCourse: {}\nAssignment: {}\n\n{}",
            address, course, assignment, DIVIDER
        );
        body.push_str(report);
        body.push('\n');
        body.push_str(DIVIDER);
        body.push_str(&format!(
            "\n\nIf you received this message in error or have questions about your grade,\n\
             reply to this message or contact me at: {}.\n\n{}",
            config.course.grader_email, DIVIDER
        ));

        format!(
            "To: {}\r\nSubject: {}, {} Grade\r\n\r\n{}",
            address, course, assignment, body
        )
    }

    /// Write one message per student to `out`, returning how many were
    /// written.
    pub async fn notify<W: Write>(
        config: &Config,
        assignment: &str,
        students: &[String],
        out: &mut W,
    ) -> GradeResult<usize> {
        for student in students {
            let report = Self::report_text(config, assignment, student).await;
            let message = Self::build_message(config, assignment, student, &report);
            writeln!(out, "{}", message).map_err(|e| GradeError::fs("<output>", e))?;
            tracing::info!(student = %student, assignment = %assignment, "Grade message written");
        }
        Ok(students.len())
    }
}
