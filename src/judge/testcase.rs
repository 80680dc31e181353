//! Test case discovery and execution

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;

use autograder_common::{GradeError, GradeResult, RunOutput, TestFixture, TestOutcome};

use crate::judge::diff::output_diff;
use crate::judge::process::ProcessRunner;
use crate::utils::read_text;

/// Runs a built executable against every fixture of one assignment
pub struct TestCaseRunner {
    assignment: String,
    fixtures: Vec<TestFixture>,
    runner: ProcessRunner,
}

impl TestCaseRunner {
    /// Discover the assignment's fixtures and validate their reference
    /// outputs.
    pub async fn discover(
        assignment: &str,
        input_dir: &Path,
        output_dir: &Path,
        timeout: Duration,
    ) -> GradeResult<Self> {
        let fixtures = discover_fixtures(assignment, input_dir, output_dir).await?;
        tracing::info!(
            assignment = %assignment,
            fixtures = fixtures.len(),
            "Discovered test fixtures"
        );
        Ok(Self {
            assignment: assignment.to_string(),
            fixtures,
            runner: ProcessRunner::new(timeout),
        })
    }

    pub fn fixtures(&self) -> &[TestFixture] {
        &self.fixtures
    }

    /// Run `executable` once per fixture, in fixture order.
    ///
    /// Outputs are never judged here: a completed run carries its raw
    /// output and, when `show_diff` is set, the diff against the reference.
    /// A run that cannot be started is recorded and the remaining fixtures
    /// still run.
    pub async fn run_tests(&self, executable: &Path, show_diff: bool) -> GradeResult<Vec<TestOutcome>> {
        let command = executable.display().to_string();
        let mut outcomes = Vec::with_capacity(self.fixtures.len());

        for fixture in &self.fixtures {
            let outcome = match self.runner.run(&command, fixture.input.as_deref()).await {
                Err(e) => {
                    tracing::warn!(
                        assignment = %self.assignment,
                        case = %fixture.name,
                        code = e.error_code(),
                        error = %e,
                        "Fixture run could not be started"
                    );
                    TestOutcome::failed(&fixture.name, e.to_string())
                }
                Ok(RunOutput::TimedOut) => {
                    let err = GradeError::ExecutionTimeout(fixture.name.clone());
                    tracing::warn!(
                        assignment = %self.assignment,
                        case = %fixture.name,
                        code = err.error_code(),
                        limit_ms = self.runner.timeout().as_millis() as u64,
                        error = %err,
                        "Fixture run timed out"
                    );
                    TestOutcome::timed_out(&fixture.name)
                }
                Ok(RunOutput::Completed(captured)) => {
                    let diff = if show_diff {
                        let reference = read_text(&fixture.expected).await?;
                        Some(output_diff(&captured, &reference))
                    } else {
                        None
                    };
                    TestOutcome::completed(&fixture.name, captured, diff)
                }
            };

            tracing::debug!(
                case = %outcome.case_name,
                status = %outcome.status,
                matches = outcome.matches_reference(),
                "Fixture finished"
            );
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

/// One fixture per file in `input_dir`, paired with the like-named file in
/// `output_dir`; or, when `input_dir` is absent or empty, a single fixture
/// without input compared against `output_dir/<assignment>`.
///
/// Fixtures are sorted by name. Dotfiles and subdirectories are ignored.
pub async fn discover_fixtures(
    assignment: &str,
    input_dir: &Path,
    output_dir: &Path,
) -> GradeResult<Vec<TestFixture>> {
    let mut inputs = list_inputs(input_dir).await?;

    let fixtures = if inputs.is_empty() {
        vec![TestFixture {
            name: assignment.to_string(),
            input: None,
            expected: output_dir.join(assignment),
        }]
    } else {
        inputs.sort();
        inputs
            .into_iter()
            .map(|(name, input)| TestFixture {
                expected: output_dir.join(&name),
                input: Some(input),
                name,
            })
            .collect()
    };

    if let Some(missing) = fixtures.iter().find(|f| !f.expected.is_file()) {
        return Err(GradeError::MissingReferenceOutput(missing.expected.clone()));
    }

    Ok(fixtures)
}

async fn list_inputs(input_dir: &Path) -> GradeResult<Vec<(String, PathBuf)>> {
    let mut entries = match fs::read_dir(input_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(GradeError::fs(input_dir, e)),
    };

    let mut inputs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| GradeError::fs(input_dir, e))?
    {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file {
            inputs.push((name, entry.path()));
        }
    }
    Ok(inputs)
}
