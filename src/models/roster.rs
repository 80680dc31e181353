//! Course roster model

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use autograder_common::{GradeError, GradeResult};

use crate::constants::MAX_SCORE_RECORD;

/// One roster entry: a student, or the record holding maximum scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    #[serde(rename = "unixName")]
    pub unix_name: String,
    #[serde(default)]
    pub withdrawn: i64,
    /// Every other key: `hw01`, `ex01`, `qz01`, ...
    #[serde(flatten)]
    pub scores: BTreeMap<String, Value>,
}

impl StudentRecord {
    pub fn is_active(&self) -> bool {
        self.withdrawn == 0
    }

    pub fn is_max_score(&self) -> bool {
        self.unix_name == MAX_SCORE_RECORD
    }

    /// Numeric score stored under `key`.
    pub fn score(&self, key: &str) -> GradeResult<f64> {
        self.scores
            .get(key)
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                GradeError::Roster(format!("no numeric {} for {}", key, self.unix_name))
            })
    }

    /// Score under `key` as written in the roster (`8`, `8.5`).
    pub fn score_text(&self, key: &str) -> GradeResult<String> {
        match self.scores.get(key) {
            Some(Value::Number(n)) => Ok(n.to_string()),
            _ => Err(GradeError::Roster(format!(
                "no numeric {} for {}",
                key, self.unix_name
            ))),
        }
    }
}

/// Parsed roster, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub records: Vec<StudentRecord>,
}

impl Roster {
    pub fn from_json(text: &str) -> GradeResult<Self> {
        let records: Vec<StudentRecord> =
            serde_json::from_str(text).map_err(|e| GradeError::Roster(e.to_string()))?;
        Ok(Self { records })
    }

    /// Unix names of active students, excluding the maximum-score record.
    pub fn active_students(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.is_active() && !r.is_max_score())
            .map(|r| r.unix_name.clone())
            .collect()
    }

    pub fn find(&self, unix_name: &str) -> Option<&StudentRecord> {
        self.records.iter().find(|r| r.unix_name == unix_name)
    }

    pub fn max_scores(&self) -> GradeResult<&StudentRecord> {
        self.find(MAX_SCORE_RECORD).ok_or_else(|| {
            GradeError::Roster(format!("no {} record in roster", MAX_SCORE_RECORD))
        })
    }
}

/// Read and parse the roster at `path`.
pub async fn load_roster(path: &Path) -> GradeResult<Roster> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GradeError::fs(path, e))?;
    let roster = Roster::from_json(&text)?;
    tracing::debug!(path = %path.display(), records = roster.records.len(), "Loaded roster");
    Ok(roster)
}
