//! Run summaries and provenance written alongside every report.

use crate::engine::TaskOutcome;
use crate::fixtures::EvaluationResult;
use crate::rubric::RUBRIC_VERSION;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current schema version for written reports
pub const SCHEMA_VERSION: u32 = 1;

/// Fold of fixture results.
///
/// `all_tests_passed == (passed_tests == total_tests)`; an empty run passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub all_tests_passed: bool,
    pub total_tests: usize,
    pub passed_tests: usize,
    /// Counted in `total_tests`, never in `passed_tests`.
    pub errored_tests: usize,
}

impl RunSummary {
    pub fn aggregate(results: &[EvaluationResult]) -> Self {
        let total_tests = results.len();
        let passed_tests = results.iter().filter(|r| r.passed).count();
        let errored_tests = results.iter().filter(|r| r.is_errored()).count();
        Self {
            all_tests_passed: passed_tests == total_tests,
            total_tests,
            passed_tests,
            errored_tests,
        }
    }

    pub fn failed_tests(&self) -> usize {
        self.total_tests - self.passed_tests
    }
}

/// Fold of a whole-catalog evaluation. Errored tasks are excluded from the average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub average_score: f64,
    pub tasks_evaluated: usize,
    pub tasks_errored: usize,
    pub total_tasks: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[TaskOutcome]) -> Self {
        let scores: Vec<f64> = outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|s| s.score())
            .collect();
        let average_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        Self {
            average_score,
            tasks_evaluated: scores.len(),
            tasks_errored: outcomes.len() - scores.len(),
            total_tasks: outcomes.len(),
        }
    }
}

/// Provenance fields for report auditability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub schema_version: u32,

    /// gitqa version that produced the report
    pub tool_version: String,

    /// `provider/model` of the judge
    pub judge: String,

    pub rubric_version: String,

    /// SHA-256 over the task catalog and reference answers
    pub corpus_digest: String,

    /// RFC 3339, UTC
    pub generated_at: String,
}

impl Provenance {
    pub fn new(tool_version: &str, judge: &str, corpus_digest: &str) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tool_version: tool_version.to_string(),
            judge: judge.to_string(),
            rubric_version: RUBRIC_VERSION.to_string(),
            corpus_digest: corpus_digest.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        }
    }
}

/// Write any report as pretty JSON, creating parent directories.
pub fn write_report<T: Serialize>(report: &T, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(out, json)?;
    Ok(())
}
