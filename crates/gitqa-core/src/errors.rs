//! Error types for evaluation runs.
//!
//! Everything that can go wrong while evaluating a single task carries the
//! offending `task_id`, so batch runs can record the failure against the right
//! entry instead of aborting the whole run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Stable classification of an evaluation failure. Reports branch on this,
/// never on the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    NotFound,
    JudgeUnavailable,
    JudgeOutput,
    Config,
    Io,
    Internal,
}

/// What a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Task,
    Reference,
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Task => f.write_str("task"),
            Missing::Reference => f.write_str("reference answer"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("task '{task_id}': no {missing} found")]
    NotFound { task_id: String, missing: Missing },

    #[error("task '{task_id}': judge unavailable after {attempts} attempt(s): {source}")]
    JudgeUnavailable {
        task_id: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error("task '{task_id}': invalid judge output: {message}")]
    InvalidJudgeOutput { task_id: String, message: String },

    #[error("task '{task_id}': evaluation aborted: {message}")]
    Aborted { task_id: String, message: String },

    /// A catalog entry that was set aside at load time.
    #[error("task '{task_id}': {message}")]
    InvalidTask { task_id: String, message: String },

    #[error("task '{task_id}': failed to read answer {}: {source}", .path.display())]
    AnswerIo {
        task_id: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EvalError {
    pub fn task_not_found(task_id: impl Into<String>) -> Self {
        Self::NotFound {
            task_id: task_id.into(),
            missing: Missing::Task,
        }
    }

    pub fn reference_not_found(task_id: impl Into<String>) -> Self {
        Self::NotFound {
            task_id: task_id.into(),
            missing: Missing::Reference,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> RunErrorKind {
        match self {
            Self::NotFound { .. } => RunErrorKind::NotFound,
            Self::JudgeUnavailable { .. } => RunErrorKind::JudgeUnavailable,
            Self::InvalidJudgeOutput { .. } => RunErrorKind::JudgeOutput,
            Self::Aborted { .. } => RunErrorKind::Internal,
            Self::InvalidTask { .. } | Self::Config { .. } => RunErrorKind::Config,
            Self::AnswerIo { .. } | Self::Io { .. } => RunErrorKind::Io,
        }
    }

    /// Task the error belongs to; `None` for run-level failures (config, corpus I/O).
    pub fn task_id(&self) -> Option<&str> {
        match self {
            Self::NotFound { task_id, .. }
            | Self::JudgeUnavailable { task_id, .. }
            | Self::InvalidJudgeOutput { task_id, .. }
            | Self::Aborted { task_id, .. }
            | Self::InvalidTask { task_id, .. }
            | Self::AnswerIo { task_id, .. } => Some(task_id),
            Self::Config { .. } | Self::Io { .. } => None,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Failures of a judging backend.
///
/// Providers return `anyhow::Result` (see [`crate::providers::llm::LlmClient`]);
/// they embed this type so callers can recover it with
/// [`ProviderError::from_anyhow`] and decide on retries by type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// `after` is the deadline we enforced; `None` when the HTTP client gave up on its own.
    #[error("request timed out{}", .after.map(|d| format!(" after {}s", d.as_secs())).unwrap_or_default())]
    Timeout { after: Option<Duration> },

    #[error("server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {message}")]
    Network { message: String },

    #[error("authentication failed (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("bad response: {message}")]
    BadResponse { message: String },
}

impl ProviderError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Server { .. } | Self::Network { .. }
        )
    }

    /// Recover a typed provider error. Anything a provider did not raise as a
    /// `ProviderError` (or a reqwest error) is a non-retryable bad response.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(typed) = err.downcast_ref::<ProviderError>() {
            return typed.clone();
        }
        if let Some(http) = err.downcast_ref::<reqwest::Error>() {
            return Self::from_reqwest(http);
        }
        Self::BadResponse {
            message: format!("{:#}", err),
        }
    }

    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { after: None }
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_provider_error_survives_anyhow_roundtrip() {
        let err = anyhow::Error::new(ProviderError::Server {
            status: 503,
            message: "overloaded".into(),
        });
        let recovered = ProviderError::from_anyhow(&err);
        assert_eq!(
            recovered,
            ProviderError::Server {
                status: 503,
                message: "overloaded".into()
            }
        );
        assert!(recovered.is_transient());
    }

    #[test]
    fn untyped_errors_are_bad_responses_whatever_they_say() {
        for msg in ["provider returned 429", "upstream said 502", "connection reset"] {
            let recovered = ProviderError::from_anyhow(&anyhow::anyhow!(msg));
            assert!(matches!(recovered, ProviderError::BadResponse { .. }), "{msg}");
            assert!(!recovered.is_transient(), "{msg}");
        }
    }

    #[test]
    fn timeout_message_names_the_deadline_only_when_known() {
        let enforced = ProviderError::Timeout {
            after: Some(Duration::from_secs(60)),
        };
        assert_eq!(enforced.to_string(), "request timed out after 60s");
        assert!(enforced.is_transient());

        let client_side = ProviderError::Timeout { after: None };
        assert_eq!(client_side.to_string(), "request timed out");
        assert!(client_side.is_transient());
    }

    #[test]
    fn task_scoped_errors_expose_task_id() {
        let err = EvalError::reference_not_found("timeline_questions_async");
        assert_eq!(err.kind(), RunErrorKind::NotFound);
        assert_eq!(err.task_id(), Some("timeline_questions_async"));
        assert_eq!(
            err.to_string(),
            "task 'timeline_questions_async': no reference answer found"
        );

        assert_eq!(EvalError::config("bad").task_id(), None);

        let err = EvalError::AnswerIo {
            task_id: "bug_patterns_x".into(),
            path: "/ds/tests/mock/bug_patterns_x_good.txt".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.kind(), RunErrorKind::Io);
        assert_eq!(err.task_id(), Some("bug_patterns_x"));
        assert!(err.to_string().starts_with("task 'bug_patterns_x': failed to read answer"));
    }

    #[test]
    fn auth_failures_are_not_retried() {
        let err = ProviderError::Auth {
            status: 401,
            message: "invalid key".into(),
        };
        assert!(!err.is_transient());
    }
}
