use std::collections::BTreeMap;

use gitqa_core::fixtures::{EvaluationResult, ExpectedRange};
use gitqa_core::report::RunSummary;
use gitqa_core::rubric::{Dimension, DimensionScore, Grade, RubricScore};
use proptest::prelude::*;

fn rubric(points: [u8; 4]) -> Result<RubricScore, String> {
    let dims: BTreeMap<_, _> = Dimension::ALL
        .into_iter()
        .zip(points)
        .map(|(d, p)| (d, DimensionScore::new(p, "j")))
        .collect();
    RubricScore::new(dims, "")
}

fn range() -> impl Strategy<Value = ExpectedRange> {
    (0u32..=100, 0u32..=100).prop_map(|(a, b)| {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        ExpectedRange::new(f64::from(lo) / 100.0, f64::from(hi) / 100.0).unwrap()
    })
}

proptest! {
    #[test]
    fn valid_dimensions_sum_to_total(points in prop::array::uniform4(0u8..=25)) {
        let score = rubric(points).unwrap();
        let sum: u32 = points.iter().map(|p| u32::from(*p)).sum();
        prop_assert_eq!(u32::from(score.total()), sum);
        prop_assert!(score.total() <= 100);
        prop_assert!((0.0..=1.0).contains(&score.normalized()));
        prop_assert_eq!(score.normalized(), f64::from(score.total()) / 100.0);
        prop_assert_eq!(score.grade(), Grade::from_total(score.total()));
    }

    #[test]
    fn any_dimension_over_cap_is_rejected(
        points in prop::array::uniform4(0u8..=25),
        idx in 0usize..4,
        over in 26u8..=u8::MAX,
    ) {
        let mut points = points;
        points[idx] = over;
        prop_assert!(rubric(points).is_err());
    }

    #[test]
    fn passed_matches_closed_interval(total in 0u8..=100, r in range()) {
        let score = f64::from(total) / 100.0;
        let result = EvaluationResult::classify("t", "case", score, r);
        prop_assert_eq!(result.passed, r.low() <= score && score <= r.high());
    }

    #[test]
    fn summary_invariants_hold(cases in prop::collection::vec((0u8..=100, range()), 0..40)) {
        let results: Vec<_> = cases
            .iter()
            .map(|(total, r)| EvaluationResult::classify("t", "case", f64::from(*total) / 100.0, *r))
            .collect();

        let summary = RunSummary::aggregate(&results);
        prop_assert_eq!(summary.total_tests, results.len());
        prop_assert!(summary.passed_tests <= summary.total_tests);
        prop_assert_eq!(summary.all_tests_passed, summary.passed_tests == summary.total_tests);
        prop_assert_eq!(summary, RunSummary::aggregate(&results));

        // Order-independent fold.
        let mut reversed = results.clone();
        reversed.reverse();
        prop_assert_eq!(summary, RunSummary::aggregate(&reversed));
    }
}

#[test]
fn tier_boundaries_are_inclusive() {
    assert!(ExpectedRange::EXCELLENT.contains(0.75));
    assert!(ExpectedRange::EXCELLENT.contains(1.0));
    assert!(ExpectedRange::POOR.contains(0.0));
    assert!(ExpectedRange::POOR.contains(0.24));
    assert!(!ExpectedRange::POOR.contains(0.25));
}
