use crate::candidate::CandidateSource;
use crate::corpus::Corpus;
use crate::errors::{EvalError, EvalResult};
use crate::judge::{Judgement, Scorer};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// One candidate to evaluate against one task.
#[derive(Debug, Clone)]
pub struct Job {
    pub task_id: String,
    /// Fixture label ("Excellent answer", ...); `None` for plain evaluations.
    pub label: Option<String>,
    pub source: CandidateSource,
}

impl Job {
    pub fn new(task_id: impl Into<String>, source: CandidateSource) -> Self {
        Self {
            task_id: task_id.into(),
            label: None,
            source,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct ScoredTask {
    pub task_id: String,
    pub judgement: Judgement,
    /// Lengths in Unicode scalar values.
    pub source_answer_length: usize,
    pub agent_answer_length: usize,
    pub duration_ms: u64,
}

impl ScoredTask {
    /// Normalized score in `[0, 1]`.
    pub fn score(&self) -> f64 {
        self.judgement.rubric.normalized()
    }
}

#[derive(Debug)]
pub struct TaskOutcome {
    pub task_id: String,
    pub label: Option<String>,
    pub result: EvalResult<ScoredTask>,
}

impl TaskOutcome {
    pub fn is_errored(&self) -> bool {
        self.result.is_err()
    }
}

#[derive(Clone)]
pub struct Runner {
    pub corpus: Arc<Corpus>,
    pub scorer: Arc<dyn Scorer>,
    pub parallel: usize,
}

impl Runner {
    pub fn new(corpus: Arc<Corpus>, scorer: Arc<dyn Scorer>, parallel: usize) -> Self {
        Self {
            corpus,
            scorer,
            parallel: parallel.max(1),
        }
    }

    /// Resolve, load and score one candidate.
    pub async fn evaluate(&self, task_id: &str, source: &CandidateSource) -> EvalResult<ScoredTask> {
        let task = self.corpus.task(task_id)?;
        let reference = self.corpus.resolve(task_id)?;
        let candidate = source.load(task_id)?;

        let started = Instant::now();
        let judgement = self.scorer.score(task, reference, &candidate).await?;
        Ok(ScoredTask {
            task_id: task_id.to_string(),
            judgement,
            source_answer_length: reference.body.chars().count(),
            agent_answer_length: candidate.body.chars().count(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Evaluate all jobs with at most `parallel` in flight. Outcomes come back
    /// in job order, whatever order they complete in; a failing job never
    /// aborts the others.
    pub async fn run_jobs(&self, jobs: Vec<Job>) -> Vec<TaskOutcome> {
        let total = jobs.len();
        let sem = Arc::new(Semaphore::new(self.parallel));
        let mut join_set = JoinSet::new();
        let mut slots: Vec<Option<TaskOutcome>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);

        for (idx, job) in jobs.iter().cloned().enumerate() {
            let sem = sem.clone();
            let this = self.clone();
            join_set.spawn(async move {
                // The semaphore is never closed, so acquisition only fails on shutdown.
                let _permit = sem.acquire_owned().await.ok();
                let result = this.evaluate(&job.task_id, &job.source).await;
                (
                    idx,
                    TaskOutcome {
                        task_id: job.task_id,
                        label: job.label,
                        result,
                    },
                )
            });
        }

        let mut done = 0usize;
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok((idx, outcome)) => {
                    done += 1;
                    match &outcome.result {
                        Ok(scored) => info!(
                            task_id = %outcome.task_id,
                            score = scored.judgement.rubric.total(),
                            done,
                            total,
                            "task scored"
                        ),
                        Err(e) => warn!(
                            task_id = %outcome.task_id,
                            error = %e,
                            done,
                            total,
                            "task errored"
                        ),
                    }
                    slots[idx] = Some(outcome);
                }
                Err(e) => warn!(error = %e, "evaluation task failed to complete"),
            }
        }

        slots
            .into_iter()
            .zip(jobs)
            .map(|(slot, job)| {
                slot.unwrap_or_else(|| TaskOutcome {
                    result: Err(EvalError::Aborted {
                        task_id: job.task_id.clone(),
                        message: "evaluation task did not complete".to_string(),
                    }),
                    task_id: job.task_id,
                    label: job.label,
                })
            })
            .collect()
    }

    /// Every catalog task, candidate taken from `<envs_dir>/<task_id>`.
    /// Entries the catalog set aside follow as errored outcomes.
    pub async fn run_batch(&self, envs_dir: &std::path::Path) -> Vec<TaskOutcome> {
        let jobs = self
            .corpus
            .catalog
            .iter()
            .map(|t| {
                Job::new(
                    t.task_id.clone(),
                    CandidateSource::EnvDir(envs_dir.join(&t.task_id)),
                )
            })
            .collect();
        let mut outcomes = self.run_jobs(jobs).await;
        outcomes.extend(self.corpus.catalog.rejected().iter().map(|r| TaskOutcome {
            task_id: r.task_id.clone(),
            label: None,
            result: Err(r.to_error()),
        }));
        outcomes
    }
}
