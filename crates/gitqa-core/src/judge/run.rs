use super::{client, prompt, JudgeService, Judgement, ScoreSource};
use crate::errors::{EvalError, EvalResult, ProviderError};
use crate::model::{CandidateAnswer, LlmResponse, ReferenceAnswer, Task};
use crate::rubric::RubricScore;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(30);
const EMPTY_ANSWER: &str = "No answer was provided.";

pub(crate) async fn score_impl(
    svc: &JudgeService,
    task: &Task,
    reference: &ReferenceAnswer,
    candidate: &CandidateAnswer,
) -> EvalResult<Judgement> {
    if candidate.is_blank() {
        debug!(task_id = %task.task_id, "empty candidate, scoring locally");
        return Ok(Judgement {
            rubric: RubricScore::zero(EMPTY_ANSWER),
            source: ScoreSource::Local,
            attempts: 0,
            prompt_sha256: None,
            judge_model: None,
        });
    }

    let Some(client) = svc.client.as_ref() else {
        return Err(EvalError::config(format!(
            "task '{}' needs a judge, but judge provider is '{}'.\n\
             hint: run with --judge openai (and OPENAI_API_KEY) or --judge fake for a dry run",
            task.task_id, svc.config.provider
        )));
    };

    let system = vec![prompt::system_prompt(svc.config.hijack_defense)];
    let user = prompt::build_prompt(task, reference, candidate);
    let digest = prompt::prompt_digest(&system[0], &user);

    let mut attempts = 0u32;
    let resp: LlmResponse = loop {
        attempts += 1;
        let outcome =
            match tokio::time::timeout(svc.config.timeout, client.complete(&user, Some(system.as_slice())))
                .await
            {
                Ok(Ok(resp)) => Ok(resp),
                Ok(Err(e)) => Err(ProviderError::from_anyhow(&e)),
                Err(_) => Err(ProviderError::Timeout {
                    after: Some(svc.config.timeout),
                }),
            };

        match outcome {
            Ok(resp) => break resp,
            Err(e) if e.is_transient() && attempts <= svc.config.max_retries => {
                let backoff = backoff_delay(&e, attempts, svc.config.backoff_base);
                warn!(
                    task_id = %task.task_id,
                    error = %e,
                    retry = attempts,
                    max_retries = svc.config.max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying judge call"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(source) => {
                return Err(EvalError::JudgeUnavailable {
                    task_id: task.task_id.clone(),
                    attempts,
                    source,
                })
            }
        }
    };

    let parsed = client::parse_rubric(&resp.text).map_err(|message| {
        EvalError::InvalidJudgeOutput {
            task_id: task.task_id.clone(),
            message,
        }
    })?;

    if let Some(reported) = parsed.reported_total {
        if reported != i64::from(parsed.rubric.total()) {
            warn!(
                task_id = %task.task_id,
                reported,
                computed = parsed.rubric.total(),
                "judge total_score disagrees with dimension sum; using the sum"
            );
        }
    }

    Ok(Judgement {
        rubric: parsed.rubric,
        source: ScoreSource::Judge,
        attempts,
        prompt_sha256: Some(digest),
        judge_model: Some(format!("{}/{}", resp.provider, resp.model)),
    })
}

/// Delay before retry number `retry` (1-based).
///
/// Honors a server `Retry-After` (capped, ±10% jitter); otherwise exponential
/// from `base` with jitter in the upper half, capped at 30s.
pub(crate) fn backoff_delay(err: &ProviderError, retry: u32, base: Duration) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(after),
    } = err
    {
        let jitter: f64 = rand::thread_rng().gen_range(0.9..=1.1);
        return (*after).min(MAX_BACKOFF).mul_f64(jitter);
    }
    if base.is_zero() {
        return Duration::ZERO;
    }
    let exp = base
        .saturating_mul(1u32 << retry.saturating_sub(1).min(16))
        .min(MAX_BACKOFF);
    let ms = exp.as_millis() as u64;
    Duration::from_millis(rand::thread_rng().gen_range(ms / 2..=ms))
}
