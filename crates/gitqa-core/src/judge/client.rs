//! Judge response parsing boundary.

use crate::rubric::{Dimension, DimensionScore, RubricScore, MAX_DIMENSION_POINTS};
use std::collections::BTreeMap;

#[derive(Debug)]
pub(crate) struct ParsedRubric {
    pub(crate) rubric: RubricScore,
    /// `total_score` as the judge reported it, if any.
    pub(crate) reported_total: Option<i64>,
}

/// Parse the first JSON object in `text`. Prose before it is ignored.
pub(crate) fn parse_rubric(text: &str) -> Result<ParsedRubric, String> {
    let text = text.trim();
    let start = text
        .find('{')
        .ok_or_else(|| "no JSON object found in judge output".to_string())?;

    let val: serde_json::Value = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| "no JSON object found in extracted text".to_string())?
        .map_err(|e| format!("invalid JSON: {}", e))?;

    let mut dimensions = BTreeMap::new();
    for dim in Dimension::ALL {
        let raw = val
            .get(dim.key())
            .ok_or_else(|| format!("judge JSON missing '{}'", dim.key()))?;
        let points = integral(raw)
            .ok_or_else(|| format!("'{}' is not an integer: {}", dim.key(), raw))?;
        if !(0..=i64::from(MAX_DIMENSION_POINTS)).contains(&points) {
            return Err(format!(
                "'{}' out of range: {} (expected 0-{})",
                dim.key(),
                points,
                MAX_DIMENSION_POINTS
            ));
        }
        let justification = val
            .get(format!("{}_justification", dim.key()))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();
        dimensions.insert(dim, DimensionScore::new(points as u8, justification));
    }

    let overall = val
        .get("overall_assessment")
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let reported_total = val.get("total_score").and_then(integral);
    let rubric = RubricScore::new(dimensions, overall)?;

    Ok(ParsedRubric {
        rubric,
        reported_total,
    })
}

/// Accept `20` and `20.0`, reject `20.5` and strings.
fn integral(v: &serde_json::Value) -> Option<i64> {
    if let Some(i) = v.as_i64() {
        return Some(i);
    }
    let f = v.as_f64()?;
    (f.fract() == 0.0).then_some(f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCELLENT: &str = r#"{
        "pattern_recognition": 25,
        "pattern_recognition_justification": "Links #1059, #1116 and #386 as one pattern.",
        "specific_evidence": 25,
        "specific_evidence_justification": "Cites all three issues.",
        "root_cause_analysis": 25,
        "root_cause_analysis_justification": "Outdated DSPy with legacy assertions.",
        "actionable_insights": 25,
        "actionable_insights_justification": "Upgrade to v2.6+.",
        "total_score": 100,
        "overall_assessment": "Matches the reference on every point."
    }"#;

    #[test]
    fn parses_complete_rubric() {
        let parsed = parse_rubric(EXCELLENT).unwrap();
        assert_eq!(parsed.rubric.total(), 100);
        assert_eq!(parsed.reported_total, Some(100));
        assert_eq!(
            parsed.rubric.get(Dimension::ActionableInsights).justification,
            "Upgrade to v2.6+."
        );
    }

    #[test]
    fn tolerates_leading_prose_and_trailing_text() {
        let text = format!("Reasoning first.\n{}\nThanks!", EXCELLENT);
        assert_eq!(parse_rubric(&text).unwrap().rubric.total(), 100);
    }

    #[test]
    fn accepts_integral_floats() {
        let text = EXCELLENT.replace("\"specific_evidence\": 25", "\"specific_evidence\": 20.0");
        assert_eq!(parse_rubric(&text).unwrap().rubric.total(), 95);
    }

    #[test]
    fn rejects_out_of_range_and_missing_keys() {
        let over = EXCELLENT.replace("\"root_cause_analysis\": 25", "\"root_cause_analysis\": 30");
        assert!(parse_rubric(&over).unwrap_err().contains("out of range"));

        let negative =
            EXCELLENT.replace("\"root_cause_analysis\": 25", "\"root_cause_analysis\": -5");
        assert!(parse_rubric(&negative).unwrap_err().contains("out of range"));

        let missing = r#"{"pattern_recognition": 10}"#;
        assert!(parse_rubric(missing)
            .unwrap_err()
            .contains("missing 'specific_evidence'"));

        assert!(parse_rubric("no json here").is_err());
    }

    #[test]
    fn reported_total_is_kept_separately_from_computed_total() {
        let text = EXCELLENT.replace("\"total_score\": 100", "\"total_score\": 90");
        let parsed = parse_rubric(&text).unwrap();
        assert_eq!(parsed.rubric.total(), 100);
        assert_eq!(parsed.reported_total, Some(90));
    }
}
