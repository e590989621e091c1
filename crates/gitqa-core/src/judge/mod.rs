mod client;
mod prompt;
mod run;

use crate::errors::EvalResult;
use crate::model::{CandidateAnswer, ReferenceAnswer, Task};
use crate::providers::llm::LlmClient;
use crate::rubric::RubricScore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

#[derive(Clone, Debug)]
pub struct JudgeRuntimeConfig {
    pub provider: String, // "openai", "fake", "none"
    /// Retries after the first attempt, for transient provider failures only.
    pub max_retries: u32,
    /// Deadline for a single judge call.
    pub timeout: Duration,
    pub backoff_base: Duration,
    pub hijack_defense: bool,
}

impl Default for JudgeRuntimeConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
            hijack_defense: true,
        }
    }
}

/// How a score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Decided without a judge call (empty candidate).
    Local,
    Judge,
}

/// A rubric score plus the facts needed to reproduce it.
#[derive(Debug, Clone)]
pub struct Judgement {
    pub rubric: RubricScore,
    pub source: ScoreSource,
    /// Judge calls made, including the successful one.
    pub attempts: u32,
    pub prompt_sha256: Option<String>,
    pub judge_model: Option<String>,
}

/// Anything that can rate a candidate against a reference.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn score(
        &self,
        task: &Task,
        reference: &ReferenceAnswer,
        candidate: &CandidateAnswer,
    ) -> EvalResult<Judgement>;

    /// `provider/model` label recorded in run provenance.
    fn describe(&self) -> String;
}

#[derive(Clone)]
pub struct JudgeService {
    config: JudgeRuntimeConfig,
    client: Option<Arc<dyn LlmClient>>,
}

impl JudgeService {
    pub fn new(config: JudgeRuntimeConfig, client: Option<Arc<dyn LlmClient>>) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Scorer for JudgeService {
    async fn score(
        &self,
        task: &Task,
        reference: &ReferenceAnswer,
        candidate: &CandidateAnswer,
    ) -> EvalResult<Judgement> {
        run::score_impl(self, task, reference, candidate).await
    }

    fn describe(&self) -> String {
        match &self.client {
            Some(c) => format!("{}/{}", c.provider_name(), c.model_id()),
            None => self.config.provider.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{EvalError, ProviderError, RunErrorKind};
    use crate::model::{Category, LlmResponse};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    enum Scripted {
        Reply(&'static str),
        Fail(ProviderError),
        Hang,
    }

    struct MockLlmClient {
        script: Mutex<Vec<Scripted>>,
        calls: AtomicU32,
    }

    impl MockLlmClient {
        fn new(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script),
                calls: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(
            &self,
            _prompt: &str,
            _system: Option<&[String]>,
        ) -> anyhow::Result<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = {
                let mut script = self.script.lock().unwrap();
                if script.is_empty() {
                    anyhow::bail!("No more mock responses");
                }
                script.remove(0)
            };
            match next {
                Scripted::Reply(text) => Ok(LlmResponse {
                    text: text.to_string(),
                    provider: "mock".to_string(),
                    model: "mock".to_string(),
                    meta: serde_json::Value::Null,
                }),
                Scripted::Fail(e) => Err(e.into()),
                Scripted::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    anyhow::bail!("unreachable")
                }
            }
        }
        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }

    const GOOD: &str = r#"{"pattern_recognition": 20, "pattern_recognition_justification": "ok",
        "specific_evidence": 15, "specific_evidence_justification": "ok",
        "root_cause_analysis": 20, "root_cause_analysis_justification": "ok",
        "actionable_insights": 10, "actionable_insights_justification": "ok",
        "total_score": 65, "overall_assessment": "Good."}"#;

    fn fixture() -> (Task, ReferenceAnswer) {
        let task = Task {
            task_id: "pattern_recognition_teleprompter_crash".into(),
            prompt: "Why does the teleprompter keep crashing?".into(),
            success_criteria: "Links the issues to one root cause.".into(),
            category: Category::BugPatterns,
            ms: None,
            dir_name: None,
        };
        let reference = ReferenceAnswer {
            task_id: task.task_id.clone(),
            body: "Outdated DSPy; see #1059 and #1116.".into(),
            evidence_links: vec!["#1059".into(), "#1116".into()],
        };
        (task, reference)
    }

    fn service(client: Arc<MockLlmClient>, max_retries: u32) -> JudgeService {
        let config = JudgeRuntimeConfig {
            provider: "mock".into(),
            max_retries,
            timeout: Duration::from_secs(5),
            backoff_base: Duration::ZERO,
            ..Default::default()
        };
        JudgeService::new(config, Some(client))
    }

    fn server_error() -> ProviderError {
        ProviderError::Server {
            status: 503,
            message: "overloaded".into(),
        }
    }

    #[tokio::test]
    async fn scores_valid_judge_output() {
        let (task, reference) = fixture();
        let client = MockLlmClient::new(vec![Scripted::Reply(GOOD)]);
        let svc = service(client.clone(), 3);

        let j = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "An answer"))
            .await
            .unwrap();

        assert_eq!(j.rubric.total(), 65);
        assert_eq!(j.source, ScoreSource::Judge);
        assert_eq!(j.attempts, 1);
        assert!(j.prompt_sha256.unwrap().starts_with("sha256:"));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_candidate_is_scored_without_judge_call() {
        let (task, reference) = fixture();
        let client = MockLlmClient::new(vec![]);
        let svc = service(client.clone(), 3);

        let j = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "  \n\t"))
            .await
            .unwrap();

        assert_eq!(j.rubric.total(), 0);
        assert_eq!(j.source, ScoreSource::Local);
        assert_eq!(j.attempts, 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_then_succeed() {
        let (task, reference) = fixture();
        let client = MockLlmClient::new(vec![
            Scripted::Fail(server_error()),
            Scripted::Fail(ProviderError::RateLimited { retry_after: None }),
            Scripted::Reply(GOOD),
        ]);
        let svc = service(client.clone(), 3);

        let j = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "An answer"))
            .await
            .unwrap();
        assert_eq!(j.attempts, 3);
        assert_eq!(j.rubric.total(), 65);
    }

    #[tokio::test]
    async fn exhausted_retries_yield_judge_unavailable() {
        let (task, reference) = fixture();
        let client = MockLlmClient::new(vec![
            Scripted::Fail(server_error()),
            Scripted::Fail(server_error()),
            Scripted::Fail(server_error()),
        ]);
        let svc = service(client.clone(), 2);

        let err = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "An answer"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), RunErrorKind::JudgeUnavailable);
        assert_eq!(err.task_id(), Some(task.task_id.as_str()));
        assert!(matches!(err, EvalError::JudgeUnavailable { attempts: 3, .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let (task, reference) = fixture();
        let client = MockLlmClient::new(vec![Scripted::Fail(ProviderError::Auth {
            status: 401,
            message: "bad key".into(),
        })]);
        let svc = service(client.clone(), 5);

        let err = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "An answer"))
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::JudgeUnavailable { attempts: 1, .. }));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn out_of_range_dimension_is_invalid_output() {
        let (task, reference) = fixture();
        let bad = r#"{"pattern_recognition": 40, "specific_evidence": 0,
            "root_cause_analysis": 0, "actionable_insights": 0}"#;
        let client = MockLlmClient::new(vec![Scripted::Reply(bad)]);
        let svc = service(client.clone(), 3);

        let err = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "An answer"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::JudgeOutput);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_times_out_and_counts_as_attempt() {
        let (task, reference) = fixture();
        let client = MockLlmClient::new(vec![Scripted::Hang, Scripted::Reply(GOOD)]);
        let svc = service(client.clone(), 1);

        let j = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "An answer"))
            .await
            .unwrap();
        assert_eq!(j.attempts, 2);
    }

    #[tokio::test]
    async fn missing_client_is_config_error() {
        let (task, reference) = fixture();
        let svc = JudgeService::new(JudgeRuntimeConfig::default(), None);

        let err = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, "An answer"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), RunErrorKind::Config);
        assert!(err.to_string().contains(&task.task_id));

        // Empty candidates never need the judge.
        let j = svc
            .score(&task, &reference, &CandidateAnswer::new(&task.task_id, ""))
            .await
            .unwrap();
        assert_eq!(j.rubric.total(), 0);
    }
}
