pub mod runner;

pub use runner::{Job, Runner, ScoredTask, TaskOutcome};
