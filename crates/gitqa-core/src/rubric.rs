//! Four-dimension answer rubric.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const MAX_DIMENSION_POINTS: u8 = 25;
pub const MAX_TOTAL_POINTS: u8 = 100;

/// Version tag of the rubric text sent to the judge. Bump when the prompt changes.
pub const RUBRIC_VERSION: &str = "git-qa-rubric-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    PatternRecognition,
    SpecificEvidence,
    RootCauseAnalysis,
    ActionableInsights,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::PatternRecognition,
        Dimension::SpecificEvidence,
        Dimension::RootCauseAnalysis,
        Dimension::ActionableInsights,
    ];

    /// Key used in judge output and report details.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::PatternRecognition => "pattern_recognition",
            Dimension::SpecificEvidence => "specific_evidence",
            Dimension::RootCauseAnalysis => "root_cause_analysis",
            Dimension::ActionableInsights => "actionable_insights",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dimension::PatternRecognition => "Pattern Recognition",
            Dimension::SpecificEvidence => "Specific Evidence",
            Dimension::RootCauseAnalysis => "Root Cause Analysis",
            Dimension::ActionableInsights => "Actionable Insights",
        }
    }

    pub fn question(self) -> &'static str {
        match self {
            Dimension::PatternRecognition => {
                "Does the agent identify the same recurring pattern as the reference, \
                 cross-referencing multiple independent issues/commits?"
            }
            Dimension::SpecificEvidence => {
                "Does the agent cite comparably specific identifiers (issue/PR numbers, commit \
                 hashes, file paths, line numbers) rather than vague references?"
            }
            Dimension::RootCauseAnalysis => {
                "Does the agent's stated cause match the reference's cause at the same level of \
                 specificity, explaining underlying causes rather than symptoms?"
            }
            Dimension::ActionableInsights => {
                "Does the agent give a concrete, correct remediation matching or subsuming the \
                 reference's recommendation?"
            }
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionScore {
    pub points: u8,
    pub justification: String,
}

impl DimensionScore {
    pub fn new(points: u8, justification: impl Into<String>) -> Self {
        Self {
            points,
            justification: justification.into(),
        }
    }
}

/// Qualitative bucket of a 0–100 total. Buckets are closed and do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Grade {
    pub fn from_total(total: u8) -> Grade {
        match total {
            75..=u8::MAX => Grade::Excellent,
            60..=74 => Grade::Good,
            40..=59 => Grade::Fair,
            _ => Grade::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Fair => "Fair",
            Grade::Poor => "Poor",
        }
    }
}

/// Rubric outcome for one candidate.
///
/// Invariants: every dimension is present with `points <= 25`, and
/// `total` is the sum of the dimension points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RubricScore {
    dimensions: BTreeMap<Dimension, DimensionScore>,
    total: u8,
    overall_assessment: String,
}

impl RubricScore {
    pub fn new(
        dimensions: BTreeMap<Dimension, DimensionScore>,
        overall_assessment: impl Into<String>,
    ) -> Result<Self, String> {
        for dim in Dimension::ALL {
            let Some(score) = dimensions.get(&dim) else {
                return Err(format!("missing score for '{}'", dim));
            };
            if score.points > MAX_DIMENSION_POINTS {
                return Err(format!(
                    "'{}' scored {} (maximum {})",
                    dim, score.points, MAX_DIMENSION_POINTS
                ));
            }
        }
        let total = dimensions.values().map(|s| s.points).sum();
        Ok(Self {
            dimensions,
            total,
            overall_assessment: overall_assessment.into(),
        })
    }

    /// Every dimension at 0 with the same justification.
    pub fn zero(reason: &str) -> Self {
        let dimensions = Dimension::ALL
            .into_iter()
            .map(|d| (d, DimensionScore::new(0, reason)))
            .collect();
        Self {
            dimensions,
            total: 0,
            overall_assessment: reason.to_string(),
        }
    }

    pub fn get(&self, dim: Dimension) -> &DimensionScore {
        // Constructors guarantee all four dimensions.
        &self.dimensions[&dim]
    }

    pub fn points(&self, dim: Dimension) -> u8 {
        self.get(dim).points
    }

    pub fn dimensions(&self) -> impl Iterator<Item = (Dimension, &DimensionScore)> {
        self.dimensions.iter().map(|(d, s)| (*d, s))
    }

    pub fn total(&self) -> u8 {
        self.total
    }

    /// `total / 100`, in `[0, 1]`.
    pub fn normalized(&self) -> f64 {
        f64::from(self.total) / f64::from(MAX_TOTAL_POINTS)
    }

    pub fn grade(&self) -> Grade {
        Grade::from_total(self.total)
    }

    pub fn overall_assessment(&self) -> &str {
        &self.overall_assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(points: [u8; 4]) -> BTreeMap<Dimension, DimensionScore> {
        Dimension::ALL
            .into_iter()
            .zip(points)
            .map(|(d, p)| (d, DimensionScore::new(p, format!("{} pts", p))))
            .collect()
    }

    #[test]
    fn total_is_sum_of_dimensions() {
        let score = RubricScore::new(scores([25, 20, 15, 10]), "solid").unwrap();
        assert_eq!(score.total(), 70);
        assert_eq!(score.normalized(), 0.70);
        assert_eq!(score.grade(), Grade::Good);
        assert_eq!(score.points(Dimension::RootCauseAnalysis), 15);
    }

    #[test]
    fn out_of_range_dimension_is_rejected() {
        let err = RubricScore::new(scores([26, 0, 0, 0]), "").unwrap_err();
        assert!(err.contains("pattern_recognition"));
    }

    #[test]
    fn missing_dimension_is_rejected() {
        let mut dims = scores([5, 5, 5, 5]);
        dims.remove(&Dimension::ActionableInsights);
        let err = RubricScore::new(dims, "").unwrap_err();
        assert!(err.contains("actionable_insights"));
    }

    #[test]
    fn zero_score_covers_every_dimension() {
        let score = RubricScore::zero("empty answer");
        assert_eq!(score.total(), 0);
        assert_eq!(score.dimensions().count(), 4);
        assert!(score.dimensions().all(|(_, s)| s.points == 0));
    }

    #[test]
    fn grade_buckets_are_closed_and_contiguous() {
        assert_eq!(Grade::from_total(100), Grade::Excellent);
        assert_eq!(Grade::from_total(75), Grade::Excellent);
        assert_eq!(Grade::from_total(74), Grade::Good);
        assert_eq!(Grade::from_total(60), Grade::Good);
        assert_eq!(Grade::from_total(59), Grade::Fair);
        assert_eq!(Grade::from_total(40), Grade::Fair);
        assert_eq!(Grade::from_total(39), Grade::Poor);
        assert_eq!(Grade::from_total(0), Grade::Poor);
    }
}
