//! Grading run orchestration
//!
//! Setup problems (grading criteria, required-file list or reference
//! outputs missing) stop the run before any student is touched. After that
//! every student is graded in turn and always ends up with a report file,
//! whatever happens to their submission.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use autograder_common::{GradeError, GradeResult, Submission};

use crate::config::{Config, PathsConfig};
use crate::constants::NOTES_FILE_NAME;
use crate::judge::compiler::Compiler;
use crate::judge::report::{BlockKind, Report};
use crate::judge::testcase::TestCaseRunner;
use crate::judge::timing::check_submission_time;
use crate::utils::{base_name, missing_files, read_text, recreate_dir};

/// Per-run switches
#[derive(Debug, Clone, Copy, Default)]
pub struct GradeOptions {
    /// Compile with `-std=c99`
    pub c99: bool,
    /// Emit the notes block
    pub notes: bool,
    /// Add the assignment's alternate main to the sources
    pub altmain: bool,
    /// Diff every completed run against its reference output
    pub diff: bool,
}

/// Counters logged at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GradeSummary {
    pub graded: usize,
    pub missing: usize,
    pub build_failures: usize,
    /// Reports cut short by an unexpected error
    pub errors: usize,
}

pub struct Grader {
    paths: PathsConfig,
    assignment: String,
    options: GradeOptions,
    deadline: DateTime<FixedOffset>,
    criteria: String,
    required: Vec<String>,
    tests: TestCaseRunner,
    compiler: Compiler,
}

impl Grader {
    /// Load the assignment's support files and reset its results directory.
    pub async fn prepare(config: &Config, assignment: &str, options: GradeOptions) -> GradeResult<Self> {
        let paths = config.paths.clone();
        let deadline = config.deadline()?;

        let criteria = read_text(&paths.grading_criteria(assignment)).await?;
        let required = parse_required_files(&read_text(&paths.required_files(assignment)).await?);

        let tests = TestCaseRunner::discover(
            assignment,
            &paths.input_fixtures(assignment),
            &paths.output_fixtures(assignment),
            config.grading.run_timeout,
        )
        .await?;

        recreate_dir(&paths.assignment_results(assignment)).await?;
        recreate_dir(&paths.student_files(assignment)).await?;

        tracing::info!(
            assignment = %assignment,
            required = required.len(),
            "Prepared grading run"
        );

        Ok(Self {
            compiler: Compiler::new(config.grading.compiler.clone(), config.grading.compile_timeout),
            paths,
            assignment: assignment.to_string(),
            options,
            deadline,
            criteria,
            required,
            tests,
        })
    }

    /// Grade `students` one after another, writing one report each.
    pub async fn grade_all(&self, students: &[String]) -> GradeSummary {
        let mut summary = GradeSummary::default();

        for student in students {
            let report = self.grade_student(student).await;

            if report.has(BlockKind::Missing) {
                summary.missing += 1;
            } else if report.has(BlockKind::Error) {
                summary.errors += 1;
            } else if !report.has(BlockKind::Tests) {
                summary.build_failures += 1;
            }
            summary.graded += 1;

            if let Err(e) = self.write_report(student, &report).await {
                tracing::error!(student = %student, error = %e, "Failed to write report");
            }
        }

        tracing::info!(
            assignment = %self.assignment,
            graded = summary.graded,
            missing = summary.missing,
            build_failures = summary.build_failures,
            errors = summary.errors,
            "Grading run finished"
        );
        summary
    }

    /// Build the report for one student.
    ///
    /// An incomplete submission gets the missing message only. Any other
    /// error keeps the blocks produced so far, adds an error block and still
    /// ends with the grading criteria.
    pub async fn grade_student(&self, student: &str) -> Report {
        tracing::info!(student = %student, assignment = %self.assignment, "Grading submission");

        let mut report = Report::new(&self.assignment, student);
        match self.fill_report(student, &mut report).await {
            Ok(()) => {}
            Err(GradeError::MissingSubmissionFiles(files)) => {
                tracing::info!(student = %student, missing = files.len(), "Submission incomplete");
                report.push_missing();
                return report;
            }
            Err(e) => {
                if e.is_per_submission() {
                    tracing::warn!(
                        student = %student,
                        code = e.error_code(),
                        error = %e,
                        "Grading stopped early"
                    );
                } else {
                    tracing::error!(
                        student = %student,
                        code = e.error_code(),
                        error = %e,
                        "Grading stopped early"
                    );
                }
                report.push_error(&e);
            }
        }
        report.push_grading_criteria(&self.criteria);
        report
    }

    async fn fill_report(&self, student: &str, report: &mut Report) -> GradeResult<()> {
        let submission = self.locate_submission(student)?;

        report.push_timing(
            &check_submission_time(&self.assignment, &submission.sources, &self.deadline).await?,
        );

        for source in &submission.sources {
            let contents = read_text(source).await?;
            report.push_source(&base_name(source), &contents);
        }

        let work_dir = self.paths.work_dir(&self.assignment, student);
        recreate_dir(&work_dir).await?;
        let executable = self.paths.executable(&self.assignment, student);

        let mut sources = submission.sources.clone();
        if self.options.altmain {
            sources.push(self.paths.alt_main(&self.assignment));
        }

        let build = self
            .compiler
            .compile(&sources, &executable, &self.compiler_flags(&submission.directory))
            .await;
        if build.success {
            tracing::info!(student = %student, "Build finished");
        } else {
            let err = GradeError::BuildFailure(base_name(&executable));
            tracing::info!(
                student = %student,
                code = err.error_code(),
                error = %err,
                "Build finished"
            );
        }
        report.push_build(&build);

        if self.options.notes {
            let notes = match &submission.notes {
                Some(path) => Some(read_text(path).await?),
                None => None,
            };
            report.push_notes(notes.as_deref());
        }

        if build.success {
            let outcomes = self.tests.run_tests(&executable, self.options.diff).await?;
            report.push_tests(&outcomes);
        }
        Ok(())
    }

    /// Resolve the required files of `student`'s submission.
    fn locate_submission(&self, student: &str) -> GradeResult<Submission> {
        let directory = self.paths.submission_dir(student, &self.assignment);
        if !self.paths.student_dir(student).is_dir() || !directory.is_dir() {
            return Err(GradeError::MissingSubmissionFiles(vec![directory]));
        }

        let sources: Vec<PathBuf> = self.required.iter().map(|f| directory.join(f)).collect();
        let missing = missing_files(&sources);
        if !missing.is_empty() {
            return Err(GradeError::MissingSubmissionFiles(missing));
        }

        let notes = Some(directory.join(NOTES_FILE_NAME)).filter(|p| p.is_file());

        Ok(Submission {
            owner: student.to_string(),
            assignment: self.assignment.clone(),
            directory,
            sources,
            notes,
        })
    }

    fn compiler_flags(&self, submission_dir: &Path) -> String {
        let mut flags = format!("-I{}", submission_dir.display());
        if self.options.c99 {
            flags.push_str(" -std=c99");
        }
        flags
    }

    async fn write_report(&self, student: &str, report: &Report) -> GradeResult<()> {
        let path = self.paths.report_file(&self.assignment, student);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| GradeError::fs(&path, e))?;
        file.write_all(report.assemble().as_bytes())
            .await
            .map_err(|e| GradeError::fs(&path, e))?;
        file.flush().await.map_err(|e| GradeError::fs(&path, e))
    }
}

/// One file name per line, blank lines ignored.
fn parse_required_files(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DIVIDER, MISSING_MSG};
    use crate::test_utils::{test_config, write_file, write_submission, write_support};

    const GOOD_MAIN: &str = "int main(void) { return 0; }\n";

    fn report_text(config: &Config, student: &str) -> String {
        std::fs::read_to_string(config.paths.report_file("hw1", student)).unwrap()
    }

    #[test]
    fn test_parse_required_files() {
        assert_eq!(
            parse_required_files("main.c\n\nutil.c\n  \nutil.h"),
            vec!["main.c", "util.c", "util.h"]
        );
    }

    #[tokio::test]
    async fn test_passing_submission() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["main.c"], &[("case1", "1 2 3\n", "1 2 3\n")]);
        write_submission(&config, "jdoe", &[("main.c", GOOD_MAIN)]);

        let options = GradeOptions { diff: true, ..GradeOptions::default() };
        let grader = Grader::prepare(&config, "hw1", options).await.unwrap();
        let summary = grader.grade_all(&["jdoe".to_string()]).await;
        assert_eq!(summary, GradeSummary { graded: 1, missing: 0, build_failures: 0, errors: 0 });

        let text = report_text(&config, "jdoe");
        assert!(text.starts_with(&format!("\n\nhw1 report for: jdoe\n{}", DIVIDER)));
        assert!(text.contains("07-31-2017 00:00 (hw1 deadline)\n"));
        assert!(text.contains(&format!("SOURCE CODE (main.c):\n{}\n{}", GOOD_MAIN, DIVIDER)));
        assert!(text.contains(&format!("COMPILATION SUCCESSFUL (main)\n{}", DIVIDER)));
        assert!(text.contains("\n\nOUTPUT: case1\n\n1 2 3\n\n\nDIFF: case1\n\n\n\n"));
        assert!(text.ends_with(&format!("Correctness: 10 pts\n{}", DIVIDER)));
    }

    #[tokio::test]
    async fn test_build_failure_skips_tests() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["main.c"], &[("case1", "1\n", "1\n")]);
        write_submission(
            &config,
            "jdoe",
            &[("main.c", "int main(void) {\n  return 0 MISSING_SEMI\n}\n")],
        );

        let grader = Grader::prepare(&config, "hw1", GradeOptions::default()).await.unwrap();
        let report = grader.grade_student("jdoe").await;
        assert!(report.has(BlockKind::Build));
        assert!(!report.has(BlockKind::Tests));

        let summary = grader.grade_all(&["jdoe".to_string()]).await;
        assert_eq!(summary.build_failures, 1);

        let text = report_text(&config, "jdoe");
        assert!(text.contains("COMPILATION FAILURE (main)\n"));
        assert!(text.contains("error: expected ';'"));
        assert!(!text.contains("OUTPUT:"));
        assert!(text.contains("Correctness: 10 pts"));
    }

    #[tokio::test]
    async fn test_missing_required_file() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["main.c", "util.c"], &[("case1", "1\n", "1\n")]);
        write_submission(&config, "jdoe", &[("main.c", GOOD_MAIN)]);

        let grader = Grader::prepare(&config, "hw1", GradeOptions::default()).await.unwrap();
        let summary = grader.grade_all(&["jdoe".to_string()]).await;
        assert_eq!(summary.missing, 1);

        assert_eq!(
            report_text(&config, "jdoe"),
            format!("\n\nhw1 report for: jdoe\n{}{}{}", DIVIDER, MISSING_MSG, DIVIDER)
        );
    }

    #[tokio::test]
    async fn test_missing_directories_still_get_reports() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["main.c"], &[("case1", "1\n", "1\n")]);
        std::fs::create_dir_all(config.paths.student_dir("nohw")).unwrap();
        write_submission(&config, "jdoe", &[("main.c", GOOD_MAIN)]);

        let grader = Grader::prepare(&config, "hw1", GradeOptions::default()).await.unwrap();
        let students = vec!["ghost".to_string(), "nohw".to_string(), "jdoe".to_string()];
        let summary = grader.grade_all(&students).await;
        assert_eq!(summary, GradeSummary { graded: 3, missing: 2, build_failures: 0, errors: 0 });

        assert!(report_text(&config, "ghost").contains(MISSING_MSG));
        assert!(report_text(&config, "nohw").contains(MISSING_MSG));
        assert!(report_text(&config, "jdoe").contains("OUTPUT: case1"));
    }

    #[tokio::test]
    async fn test_unexpected_error_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["main.c"], &[("case1", "1\n", "1\n")]);
        write_submission(&config, "jdoe", &[("main.c", GOOD_MAIN)]);

        let grader = Grader::prepare(&config, "hw1", GradeOptions::default()).await.unwrap();
        // Per-student work directories can no longer be created.
        let student_files = config.paths.student_files("hw1");
        std::fs::remove_dir_all(&student_files).unwrap();
        write_file(&student_files, "");

        let summary = grader.grade_all(&["jdoe".to_string()]).await;
        assert_eq!(summary, GradeSummary { graded: 1, missing: 0, build_failures: 0, errors: 1 });

        let text = report_text(&config, "jdoe");
        assert!(text.contains(&format!("SOURCE CODE (main.c):\n{}\n{}", GOOD_MAIN, DIVIDER)));
        assert!(text.contains("Grading stopped: File error at "));
        assert!(!text.contains("COMPILATION"));
        assert!(text.ends_with(&format!("Correctness: 10 pts\n{}", DIVIDER)));
    }

    #[tokio::test]
    async fn test_missing_support_files_are_fatal() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());

        let err = Grader::prepare(&config, "hw1", GradeOptions::default()).await.err().unwrap();
        assert!(!err.is_per_submission());

        write_support(&config, &["main.c"], &[("case1", "1\n", "1\n")]);
        std::fs::remove_file(config.paths.output_fixtures("hw1").join("case1")).unwrap();
        let err = Grader::prepare(&config, "hw1", GradeOptions::default()).await.err().unwrap();
        assert!(matches!(err, GradeError::MissingReferenceOutput(_)));
    }

    #[tokio::test]
    async fn test_notes_block() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["main.c"], &[("case1", "1\n", "1\n")]);
        write_submission(&config, "jdoe", &[("main.c", GOOD_MAIN), ("notes.txt", "two hours")]);
        write_submission(&config, "asmith", &[("main.c", GOOD_MAIN)]);

        let options = GradeOptions { notes: true, ..GradeOptions::default() };
        let grader = Grader::prepare(&config, "hw1", options).await.unwrap();
        grader.grade_all(&["jdoe".to_string(), "asmith".to_string()]).await;

        assert!(report_text(&config, "jdoe").contains("SOURCE CODE (notes.txt):\ntwo hours\n"));
        assert!(report_text(&config, "asmith").contains("notes.txt file not found.\n"));
    }

    #[tokio::test]
    async fn test_alternate_main_is_compiled() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["util.c"], &[("case1", "1\n", "1\n")]);
        write_file(&config.paths.alt_main("hw1"), "int main(void) { MISSING_SEMI }\n");
        write_submission(&config, "jdoe", &[("util.c", "int util(void) { return 1; }\n")]);

        let grader = Grader::prepare(&config, "hw1", GradeOptions::default()).await.unwrap();
        assert!(grader.grade_student("jdoe").await.has(BlockKind::Tests));

        let options = GradeOptions { altmain: true, ..GradeOptions::default() };
        let grader = Grader::prepare(&config, "hw1", options).await.unwrap();
        assert!(!grader.grade_student("jdoe").await.has(BlockKind::Tests));
    }

    #[tokio::test]
    async fn test_compiler_flags() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(&config, &["main.c"], &[("case1", "1\n", "1\n")]);
        let dir = Path::new("/course/jdoe/hw1");

        let grader = Grader::prepare(&config, "hw1", GradeOptions::default()).await.unwrap();
        assert_eq!(grader.compiler_flags(dir), "-I/course/jdoe/hw1");

        let options = GradeOptions { c99: true, ..GradeOptions::default() };
        let grader = Grader::prepare(&config, "hw1", options).await.unwrap();
        assert_eq!(grader.compiler_flags(dir), "-I/course/jdoe/hw1 -std=c99");
    }

    #[tokio::test]
    async fn test_repeated_runs_are_byte_identical() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        write_support(
            &config,
            &["main.c"],
            &[("case1", "1 2 3\n", "1 2 3\n"), ("case2", "x\n", "y\n")],
        );
        write_submission(&config, "jdoe", &[("main.c", GOOD_MAIN)]);
        let options = GradeOptions { diff: true, ..GradeOptions::default() };

        Grader::prepare(&config, "hw1", options)
            .await
            .unwrap()
            .grade_all(&["jdoe".to_string()])
            .await;
        let first = report_text(&config, "jdoe");

        Grader::prepare(&config, "hw1", options)
            .await
            .unwrap()
            .grade_all(&["jdoe".to_string()])
            .await;
        let second = report_text(&config, "jdoe");

        assert_eq!(first, second);
        assert!(second.contains("-x\n+y\n"));
    }
}
