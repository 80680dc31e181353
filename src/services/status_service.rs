//! Grade-status reports computed from roster scores

use std::path::PathBuf;

use autograder_common::{GradeError, GradeResult};

use crate::config::Config;
use crate::constants::{DIVIDER, FINAL_REPORT_FILE};
use crate::models::{Roster, StudentRecord};
use crate::utils::recreate_dir;

/// Number of graded homeworks, exams and quizzes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    pub homework: usize,
    pub exams: usize,
    pub quizzes: usize,
}

impl ItemCounts {
    /// Count the `hw`, `ex` and `qz` keys of a record.
    pub fn from_record(record: &StudentRecord) -> Self {
        let mut counts = Self::default();
        for key in record.scores.keys() {
            if key.contains("hw") {
                counts.homework += 1;
            } else if key.contains("ex") {
                counts.exams += 1;
            } else if key.contains("qz") {
                counts.quizzes += 1;
            }
        }
        counts
    }

    /// Replace counts given on the command line.
    pub fn with_overrides(
        self,
        homework: Option<usize>,
        exams: Option<usize>,
        quizzes: Option<usize>,
    ) -> Self {
        Self {
            homework: homework.unwrap_or(self.homework),
            exams: exams.unwrap_or(self.exams),
            quizzes: quizzes.unwrap_or(self.quizzes),
        }
    }
}

/// Rendered status of one student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentStatus {
    pub unix_name: String,
    pub raw_grade: i64,
    pub text: String,
}

pub struct StatusService;

impl StatusService {
    /// Write one status file per student plus the ranking file under
    /// `<results>/status<stamp>`, returning the directory.
    pub async fn generate(
        config: &Config,
        roster: &Roster,
        only: Option<&str>,
        counts: ItemCounts,
        stamp: &str,
    ) -> GradeResult<PathBuf> {
        let max_scores = roster.max_scores()?;

        let students: Vec<&StudentRecord> = match only {
            Some(name) => vec![roster
                .find(name)
                .ok_or_else(|| GradeError::Roster(format!("{} is not in the roster", name)))?],
            None => roster
                .records
                .iter()
                .filter(|r| r.is_active() && !r.is_max_score())
                .collect(),
        };

        let mut statuses = Vec::with_capacity(students.len());
        for student in students {
            statuses.push(Self::student_status(student, max_scores, counts)?);
        }

        let dir = config.paths.status_dir(stamp);
        recreate_dir(&dir).await?;
        for status in &statuses {
            let path = dir.join(&status.unix_name);
            tokio::fs::write(&path, &status.text)
                .await
                .map_err(|e| GradeError::fs(&path, e))?;
        }

        let path = dir.join(FINAL_REPORT_FILE);
        tokio::fs::write(&path, Self::final_report(&statuses))
            .await
            .map_err(|e| GradeError::fs(&path, e))?;

        tracing::info!(
            dir = %dir.display(),
            students = statuses.len(),
            "Status reports written"
        );
        Ok(dir)
    }

    pub fn student_status(
        student: &StudentRecord,
        max_scores: &StudentRecord,
        counts: ItemCounts,
    ) -> GradeResult<StudentStatus> {
        let (hw, hw_text) = Self::homework_section(student, max_scores, counts.homework)?;
        let (ex, ex_text) = Self::exam_section(student, counts.exams)?;
        let (qz, qz_text) = Self::quiz_section(student, counts.quizzes)?;
        let raw_grade = round_half_even(hw as f64 * 0.3 + ex as f64 * 0.6 + qz as f64 * 0.1);

        let text = format!(
            "\n\nStatus report for: {}\n{}{}{}{}Raw final grade: {}",
            student.unix_name, DIVIDER, hw_text, ex_text, qz_text, raw_grade
        );

        Ok(StudentStatus {
            unix_name: student.unix_name.clone(),
            raw_grade,
            text,
        })
    }

    /// Homework lines with per-item percentages, and their average.
    pub fn homework_section(
        student: &StudentRecord,
        max_scores: &StudentRecord,
        count: usize,
    ) -> GradeResult<(i64, String)> {
        let mut text = format!("Homework\n{}", DIVIDER);
        let mut total = 0;

        for i in 1..=count {
            let key = format!("hw{:02}", i);
            let max = max_scores.score(&key)?;
            if max <= 0.0 {
                return Err(GradeError::Roster(format!("maximum score of {} is not positive", key)));
            }
            let percent = round_half_even(student.score(&key)? * 100.0 / max);
            total += percent;
            text.push_str(&format!(
                "  {}: {:>2} / {} ({})\n",
                key,
                student.score_text(&key)?,
                max_scores.score_text(&key)?,
                percent
            ));
        }

        let average = mean(total as f64, count);
        text.push_str(&format!("hw average: {}\n{}", average, DIVIDER));
        Ok((average, text))
    }

    /// Exam lines and the average of all but the lowest exam.
    pub fn exam_section(student: &StudentRecord, count: usize) -> GradeResult<(i64, String)> {
        let mut text = format!("Exams\n{}", DIVIDER);
        let mut scores = Vec::with_capacity(count);

        for i in 1..=count {
            let key = format!("ex{:02}", i);
            scores.push(student.score(&key)?);
            text.push_str(&format!("  ex{}: {:>3}\n", i, student.score_text(&key)?));
        }

        let average = match scores.len() {
            0 => 0,
            1 => round_half_even(scores[0]),
            n => {
                let lowest = scores.iter().copied().fold(f64::INFINITY, f64::min);
                mean(scores.iter().sum::<f64>() - lowest, n - 1)
            }
        };
        let best = if count > 1 { count - 1 } else { count };
        text.push_str(&format!("exam average (best {}): {}\n{}", best, average, DIVIDER));
        Ok((average, text))
    }

    pub fn quiz_section(student: &StudentRecord, count: usize) -> GradeResult<(i64, String)> {
        let mut text = format!("Quizzes\n{}", DIVIDER);
        let mut total = 0.0;

        for i in 1..=count {
            let key = format!("qz{:02}", i);
            total += student.score(&key)?;
            text.push_str(&format!("  qz{}: {:>3}\n", i, student.score_text(&key)?));
        }

        let average = mean(total, count);
        text.push_str(&format!("quiz average: {}\n{}", average, DIVIDER));
        Ok((average, text))
    }

    /// Students sorted by raw grade, lowest first, names dot-padded to 15.
    pub fn final_report(statuses: &[StudentStatus]) -> String {
        let mut ranked: Vec<&StudentStatus> = statuses.iter().collect();
        ranked.sort_by_key(|s| s.raw_grade);
        ranked
            .iter()
            .map(|s| format!("{:.<15} {}\n", s.unix_name, s.raw_grade))
            .collect()
    }
}

fn mean(total: f64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    round_half_even(total / count as f64)
}

fn round_half_even(value: f64) -> i64 {
    value.round_ties_even() as i64
}
