//! Report assembly
//!
//! A report is an append-only list of text blocks. Each block is written
//! followed by [`DIVIDER`], and blocks always serialize in the same order
//! regardless of the order they were added in or what they contain.

use autograder_common::{BuildResult, GradeError, OutcomeStatus, TestOutcome};

use crate::constants::{
    DIVIDER, EXECUTION_FAILED_PREFIX, GRADING_STOPPED_PREFIX, MISSING_MSG, NOTES_FILE_NAME,
    TIMEOUT_MSG,
};

/// Kinds of report blocks, in serialization order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockKind {
    Header,
    Missing,
    Timing,
    Source,
    Build,
    Notes,
    Tests,
    Error,
    GradingCriteria,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBlock {
    pub kind: BlockKind,
    pub text: String,
}

/// Report for one submission
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    blocks: Vec<ReportBlock>,
}

impl Report {
    /// Start a report with its header block.
    pub fn new(assignment: &str, student: &str) -> Self {
        let mut report = Self::default();
        report.push(
            BlockKind::Header,
            format!("\n\n{} report for: {}\n", assignment, student),
        );
        report
    }

    pub fn blocks(&self) -> &[ReportBlock] {
        &self.blocks
    }

    pub fn has(&self, kind: BlockKind) -> bool {
        self.blocks.iter().any(|b| b.kind == kind)
    }

    fn push(&mut self, kind: BlockKind, text: String) {
        self.blocks.push(ReportBlock { kind, text });
    }

    /// The fixed message for an absent submission.
    pub fn push_missing(&mut self) {
        self.push(BlockKind::Missing, MISSING_MSG.to_string());
    }

    /// Timing annotation lines, one per line.
    pub fn push_timing(&mut self, lines: &[String]) {
        let text = lines.iter().map(|l| format!("{}\n", l)).collect();
        self.push(BlockKind::Timing, text);
    }

    pub fn push_source(&mut self, file_name: &str, contents: &str) {
        self.push(BlockKind::Source, source_listing(file_name, contents));
    }

    pub fn push_build(&mut self, result: &BuildResult) {
        self.push(BlockKind::Build, result.message.clone());
    }

    /// Contents of the notes file, or a not-found line when absent.
    pub fn push_notes(&mut self, contents: Option<&str>) {
        let text = match contents {
            Some(contents) => source_listing(NOTES_FILE_NAME, contents),
            None => format!("{} file not found.\n", NOTES_FILE_NAME),
        };
        self.push(BlockKind::Notes, text);
    }

    /// All fixture outcomes as one block.
    pub fn push_tests(&mut self, outcomes: &[TestOutcome]) {
        let text = outcomes.iter().map(render_outcome).collect();
        self.push(BlockKind::Tests, text);
    }

    /// The error that ended grading before every block was produced.
    pub fn push_error(&mut self, error: &GradeError) {
        self.push(BlockKind::Error, format!("{}{}\n", GRADING_STOPPED_PREFIX, error));
    }

    pub fn push_grading_criteria(&mut self, criteria: &str) {
        self.push(BlockKind::GradingCriteria, format!("{}\n", criteria));
    }

    /// Serialize every block followed by the divider.
    pub fn assemble(&self) -> String {
        let mut ordered: Vec<&ReportBlock> = self.blocks.iter().collect();
        ordered.sort_by_key(|b| b.kind);

        let mut out = String::new();
        for block in ordered {
            out.push_str(&block.text);
            out.push_str(DIVIDER);
        }
        out
    }
}

fn source_listing(file_name: &str, contents: &str) -> String {
    format!("SOURCE CODE ({}):\n{}\n", file_name, contents)
}

/// Render one fixture outcome.
pub fn render_outcome(outcome: &TestOutcome) -> String {
    let mut out = format!("\n\nOUTPUT: {}\n\n", outcome.case_name);

    match outcome.status {
        OutcomeStatus::Timeout => {
            out.push_str(TIMEOUT_MSG);
            return out;
        }
        OutcomeStatus::Failed => {
            out.push_str(&format!("{}{}\n", EXECUTION_FAILED_PREFIX, outcome.captured));
            return out;
        }
        OutcomeStatus::Completed => {}
    }

    out.push_str(&outcome.captured);
    if let Some(diff) = &outcome.diff {
        out.push_str(&format!("\n\nDIFF: {}\n\n", outcome.case_name));
        for line in diff {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("\n\n");
    }
    out
}
