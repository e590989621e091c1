use crate::engine::{ScoredTask, TaskOutcome};
use crate::fixtures::EvaluationResult;
use crate::report::summary::{BatchSummary, RunSummary};
use crate::rubric::{Dimension, MAX_DIMENSION_POINTS, MAX_TOTAL_POINTS};

/// Per-dimension breakdown lines. Deterministic, unit-testable.
#[must_use]
pub fn format_breakdown(scored: &ScoredTask) -> Vec<String> {
    let rubric = &scored.judgement.rubric;
    let mut lines: Vec<String> = Dimension::ALL
        .iter()
        .map(|d| {
            format!(
                "    {}: {}/{}",
                d.title(),
                rubric.points(*d),
                MAX_DIMENSION_POINTS
            )
        })
        .collect();
    lines.push(format!(
        "    Total: {}/{} ({})",
        rubric.total(),
        MAX_TOTAL_POINTS,
        rubric.grade().label()
    ));
    lines
}

pub fn print_task(scored: &ScoredTask) {
    eprintln!();
    eprintln!("Task: {}", scored.task_id);
    eprintln!("Score: {:.2}", scored.score());
    for line in format_breakdown(scored) {
        eprintln!("{}", line);
    }
    let overall = scored.judgement.rubric.overall_assessment();
    if !overall.is_empty() {
        eprintln!("    Assessment: {}", overall);
    }
}

pub fn print_batch(outcomes: &[TaskOutcome], summary: &BatchSummary) {
    eprintln!();
    for o in outcomes {
        match &o.result {
            Ok(s) => eprintln!("✅ {:<48} {:.2}", o.task_id, s.score()),
            Err(e) => eprintln!("❌ {:<48} ERROR ({})", o.task_id, e),
        }
    }
    eprintln!();
    eprintln!(
        "Average score: {:.2} ({}/{} tasks evaluated, {} errored)",
        summary.average_score, summary.tasks_evaluated, summary.total_tasks, summary.tasks_errored
    );
}

pub fn print_fixtures(outcomes: &[TaskOutcome], results: &[EvaluationResult], summary: &RunSummary) {
    eprintln!();
    for (i, (o, r)) in outcomes.iter().zip(results).enumerate() {
        eprintln!("Test {}: {} [{}]", i + 1, r.candidate_label, r.task_id);
        match &o.result {
            Ok(scored) => {
                let status = if r.passed { "✅ PASS" } else { "❌ FAIL" };
                eprintln!(
                    "  Score: {:.2} (expected: {}) {}",
                    r.score, r.expected_range, status
                );
                for line in format_breakdown(scored) {
                    eprintln!("{}", line);
                }
            }
            Err(e) => eprintln!("  ❌ ERROR: {}", e),
        }
    }
    eprintln!();
    eprintln!(
        "Summary: {}/{} tests passed ({} errored)",
        summary.passed_tests, summary.total_tests, summary.errored_tests
    );
}
