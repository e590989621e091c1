pub mod batch;
pub mod dispatch;
pub mod eval;
pub mod fixtures;
pub(crate) mod runner_builder;
pub mod tasks;

pub use dispatch::dispatch;
