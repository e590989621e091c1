use crate::engine::{ScoredTask, TaskOutcome};
use crate::fixtures::EvaluationResult;
use crate::report::summary::{BatchSummary, Provenance, RunSummary};
use crate::rubric::RUBRIC_VERSION;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Flat score breakdown: `<dimension>`, `<dimension>_justification`, totals and lengths.
pub fn score_details(scored: &ScoredTask) -> Value {
    let rubric = &scored.judgement.rubric;
    let mut details = Map::new();
    for (dim, score) in rubric.dimensions() {
        details.insert(dim.key().to_string(), json!(score.points));
        details.insert(
            format!("{}_justification", dim.key()),
            json!(score.justification),
        );
    }
    details.insert("total_score".into(), json!(rubric.total()));
    details.insert(
        "overall_assessment".into(),
        json!(rubric.overall_assessment()),
    );
    details.insert("grade".into(), json!(rubric.grade().label()));
    details.insert(
        "source_answer_length".into(),
        json!(scored.source_answer_length),
    );
    details.insert(
        "agent_answer_length".into(),
        json!(scored.agent_answer_length),
    );
    details.insert("task_id".into(), json!(scored.task_id));
    details.insert("rubric_version".into(), json!(RUBRIC_VERSION));
    details.insert("score_source".into(), json!(scored.judgement.source));
    details.insert("judge_attempts".into(), json!(scored.judgement.attempts));
    if let Some(digest) = &scored.judgement.prompt_sha256 {
        details.insert("prompt_sha256".into(), json!(digest));
    }
    if let Some(model) = &scored.judgement.judge_model {
        details.insert("judge_model".into(), json!(model));
    }
    details.insert("duration_ms".into(), json!(scored.duration_ms));
    Value::Object(details)
}

/// `{task_id, score, details}`, or `{task_id, score: 0.0, error, error_kind}`.
pub fn task_record(outcome: &TaskOutcome) -> Value {
    match &outcome.result {
        Ok(scored) => json!({
            "task_id": outcome.task_id,
            "score": scored.score(),
            "details": score_details(scored),
        }),
        Err(e) => json!({
            "task_id": outcome.task_id,
            "score": 0.0,
            "error": e.to_string(),
            "error_kind": e.kind(),
        }),
    }
}

/// `{task_id, test_case, score, expected_range, passed, details}`; errored cases carry `error` instead of details.
pub fn fixture_record(outcome: &TaskOutcome, result: &EvaluationResult) -> Value {
    let mut record = json!({
        "task_id": result.task_id,
        "test_case": result.candidate_label,
        "score": result.score,
        "expected_range": result.expected_range,
        "passed": result.passed,
    });
    match &outcome.result {
        Ok(scored) => record["details"] = score_details(scored),
        Err(e) => {
            record["error"] = json!(e.to_string());
            record["error_kind"] = json!(e.kind());
        }
    }
    record
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleReport {
    pub task_id: String,
    pub score: f64,
    pub details: Value,
    pub provenance: Provenance,
}

impl SingleReport {
    pub fn new(scored: &ScoredTask, provenance: Provenance) -> Self {
        Self {
            task_id: scored.task_id.clone(),
            score: scored.score(),
            details: score_details(scored),
            provenance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub results: Vec<Value>,
    pub provenance: Provenance,
}

impl BatchReport {
    pub fn new(outcomes: &[TaskOutcome], provenance: Provenance) -> Self {
        Self {
            summary: BatchSummary::from_outcomes(outcomes),
            results: outcomes.iter().map(task_record).collect(),
            provenance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FixtureReport {
    pub summary: RunSummary,
    pub results: Vec<Value>,
    pub provenance: Provenance,
}

impl FixtureReport {
    pub fn new(
        outcomes: &[TaskOutcome],
        results: &[EvaluationResult],
        provenance: Provenance,
    ) -> Self {
        Self {
            summary: RunSummary::aggregate(results),
            results: outcomes
                .iter()
                .zip(results)
                .map(|(o, r)| fixture_record(o, r))
                .collect(),
            provenance,
        }
    }
}
