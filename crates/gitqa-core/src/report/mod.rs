pub mod console;
pub mod json;
pub mod summary;

pub use summary::{BatchSummary, Provenance, RunSummary};
