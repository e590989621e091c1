//! Calibration fixtures: known-quality answers with the score range each must land in.

use crate::candidate::CandidateSource;
use crate::engine::{Job, Runner, TaskOutcome};
use crate::errors::{EvalError, EvalResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const SUPPORTED_SUITE_VERSION: u32 = 1;
pub const MOCK_DIR: &str = "tests/mock";

/// Closed score interval `[low, high]` within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectedRange {
    low: f64,
    high: f64,
}

impl ExpectedRange {
    pub const EXCELLENT: ExpectedRange = ExpectedRange {
        low: 0.75,
        high: 1.00,
    };
    pub const GOOD: ExpectedRange = ExpectedRange {
        low: 0.60,
        high: 0.79,
    };
    pub const FAIR: ExpectedRange = ExpectedRange {
        low: 0.40,
        high: 0.65,
    };
    pub const POOR: ExpectedRange = ExpectedRange {
        low: 0.00,
        high: 0.24,
    };

    pub fn new(low: f64, high: f64) -> Result<Self, String> {
        if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) {
            return Err(format!("range bounds must be within 0-1, got {}-{}", low, high));
        }
        if low > high {
            return Err(format!("range low {} exceeds high {}", low, high));
        }
        Ok(Self { low, high })
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Both ends inclusive.
    pub fn contains(&self, score: f64) -> bool {
        self.low <= score && score <= self.high
    }
}

impl fmt::Display for ExpectedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}-{:.2}", self.low, self.high)
    }
}

impl FromStr for ExpectedRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once('-')
            .ok_or_else(|| format!("expected '<low>-<high>', got '{}'", s))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid range bound '{}' in '{}'", v.trim(), s))
        };
        Self::new(parse(low)?, parse(high)?)
    }
}

impl Serialize for ExpectedRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExpectedRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Fixture outcome for one labeled candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    pub task_id: String,
    pub candidate_label: String,
    pub score: f64,
    pub passed: bool,
    pub expected_range: ExpectedRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    pub fn classify(
        task_id: impl Into<String>,
        candidate_label: impl Into<String>,
        score: f64,
        expected_range: ExpectedRange,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            candidate_label: candidate_label.into(),
            score,
            passed: expected_range.contains(score),
            expected_range,
            error: None,
        }
    }

    /// A case that could not be scored. Never passes.
    pub fn errored(
        task_id: impl Into<String>,
        candidate_label: impl Into<String>,
        expected_range: ExpectedRange,
        error: &EvalError,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            candidate_label: candidate_label.into(),
            score: 0.0,
            passed: false,
            expected_range,
            error: Some(error.to_string()),
        }
    }

    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCase {
    pub label: String,
    /// Inline answer text.
    #[serde(default)]
    pub answer: Option<String>,
    /// Answer file, relative to the suite file.
    #[serde(default)]
    pub answer_file: Option<PathBuf>,
    pub expected_range: ExpectedRange,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureSuite {
    pub version: u32,
    pub task_id: String,
    pub cases: Vec<FixtureCase>,
}

impl FixtureSuite {
    pub fn load(path: &Path) -> EvalResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
        let mut suite: FixtureSuite = serde_yaml::from_str(&raw)
            .map_err(|e| EvalError::config(format!("{}: {}", path.display(), e)))?;
        if suite.version != SUPPORTED_SUITE_VERSION {
            return Err(EvalError::config(format!(
                "{}: unsupported fixture suite version {} (supported: {})",
                path.display(),
                suite.version,
                SUPPORTED_SUITE_VERSION
            )));
        }
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for case in &mut suite.cases {
            match (&case.answer, &case.answer_file) {
                (Some(_), None) => {}
                (None, Some(file)) => case.answer_file = Some(base.join(file)),
                _ => {
                    return Err(EvalError::config(format!(
                        "{}: case '{}' needs exactly one of 'answer' or 'answer_file'",
                        path.display(),
                        case.label
                    )))
                }
            }
        }
        Ok(suite)
    }

    /// The four quality tiers, answers read from
    /// `<dataset>/tests/mock/<task_id>_{excellent,good,fair,poor}.txt`.
    pub fn standard(task_id: &str, dataset_dir: &Path) -> Self {
        let mock_dir = dataset_dir.join(MOCK_DIR);
        let tiers = [
            ("excellent", "Excellent answer", ExpectedRange::EXCELLENT),
            ("good", "Good answer", ExpectedRange::GOOD),
            ("fair", "Fair answer", ExpectedRange::FAIR),
            ("poor", "Poor answer", ExpectedRange::POOR),
        ];
        let cases = tiers
            .into_iter()
            .map(|(tier, label, expected_range)| FixtureCase {
                label: label.to_string(),
                answer: None,
                answer_file: Some(mock_dir.join(format!("{}_{}.txt", task_id, tier))),
                expected_range,
            })
            .collect();
        Self {
            version: SUPPORTED_SUITE_VERSION,
            task_id: task_id.to_string(),
            cases,
        }
    }

    fn jobs(&self) -> Vec<Job> {
        self.cases
            .iter()
            .map(|case| {
                let source = match (&case.answer, &case.answer_file) {
                    (Some(text), _) => CandidateSource::Text(text.clone()),
                    (None, Some(path)) => CandidateSource::Fixture(path.clone()),
                    (None, None) => CandidateSource::Text(String::new()),
                };
                Job::new(self.task_id.clone(), source).labeled(case.label.clone())
            })
            .collect()
    }

    /// Score every case. Returns raw outcomes (for details) alongside the
    /// classified results, both in case order.
    pub async fn run(&self, runner: &Runner) -> (Vec<TaskOutcome>, Vec<EvaluationResult>) {
        let outcomes = runner.run_jobs(self.jobs()).await;
        let results = outcomes
            .iter()
            .zip(&self.cases)
            .map(|(outcome, case)| match &outcome.result {
                Ok(scored) => EvaluationResult::classify(
                    &self.task_id,
                    &case.label,
                    scored.score(),
                    case.expected_range,
                ),
                Err(e) => {
                    EvaluationResult::errored(&self.task_id, &case.label, case.expected_range, e)
                }
            })
            .collect();
        (outcomes, results)
    }
}
