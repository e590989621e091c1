//! Locating the agent's answer for a task.

use crate::errors::{EvalError, EvalResult};
use crate::model::CandidateAnswer;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files an agent may leave its answer in, probed in this order.
pub const AGENT_OUTPUT_FILES: [&str; 8] = [
    "answer.txt",
    "analysis.md",
    "response.txt",
    "output.txt",
    "result.md",
    "solution.txt",
    "findings.txt",
    "agent_output.txt",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    /// Answer given inline (e.g. an agent's live output).
    Text(String),
    /// Explicit answer file, falling back to the environment directory when absent.
    File {
        path: PathBuf,
        env_dir: Option<PathBuf>,
    },
    /// Probe the agent's environment directory for a known output file.
    EnvDir(PathBuf),
    /// Calibration answer that must exist; a missing file is an error.
    Fixture(PathBuf),
}

impl CandidateSource {
    /// Load the candidate. Nothing to read yields an empty answer, which scores 0.
    pub fn load(&self, task_id: &str) -> EvalResult<CandidateAnswer> {
        let body = match self {
            CandidateSource::Text(text) => text.clone(),
            CandidateSource::File { path, env_dir } => {
                if path.is_file() {
                    read_answer(task_id, path)?
                } else {
                    warn!(task_id, path = %path.display(), "agent answer file not found");
                    match env_dir {
                        Some(dir) => probe_env_dir(task_id, dir)?,
                        None => String::new(),
                    }
                }
            }
            CandidateSource::EnvDir(dir) => probe_env_dir(task_id, dir)?,
            CandidateSource::Fixture(path) => read_answer(task_id, path)?,
        };
        Ok(CandidateAnswer::new(task_id, body))
    }
}

fn probe_env_dir(task_id: &str, dir: &Path) -> EvalResult<String> {
    for name in AGENT_OUTPUT_FILES {
        let path = dir.join(name);
        if path.is_file() {
            debug!(task_id, path = %path.display(), "using agent output file");
            return read_answer(task_id, &path);
        }
    }
    warn!(
        task_id,
        env_dir = %dir.display(),
        "no agent answer file found; scoring empty answer"
    );
    Ok(String::new())
}

/// Non-UTF-8 bytes are replaced rather than rejected: a garbled answer is
/// still an answer.
fn read_answer(task_id: &str, path: &Path) -> EvalResult<String> {
    let bytes = std::fs::read(path).map_err(|source| EvalError::AnswerIo {
        task_id: task_id.to_string(),
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
