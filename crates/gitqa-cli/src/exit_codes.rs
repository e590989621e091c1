//! Process exit codes. Part of the public contract: CI scripts branch on them.

pub const SUCCESS: i32 = 0;
pub const TEST_FAILURE: i32 = 1; // Fixture out of range, or a batch task errored
pub const CONFIG_ERROR: i32 = 2; // Bad config, usage, unknown task, unreadable corpus
pub const INFRA_ERROR: i32 = 3; // Judge unavailable or unusable

use gitqa_core::errors::{EvalError, RunErrorKind};

/// Exit code for an evaluation that could not produce a score.
pub fn for_error(err: &EvalError) -> i32 {
    for_kind(err.kind())
}

pub fn for_kind(kind: RunErrorKind) -> i32 {
    match kind {
        RunErrorKind::NotFound | RunErrorKind::Config | RunErrorKind::Io => CONFIG_ERROR,
        RunErrorKind::JudgeUnavailable | RunErrorKind::JudgeOutput | RunErrorKind::Internal => {
            INFRA_ERROR
        }
    }
}
