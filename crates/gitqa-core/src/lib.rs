pub mod candidate;
pub mod catalog;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod errors;
pub mod fixtures;
pub mod judge;
pub mod model;
pub mod providers;
pub mod report;
pub mod rubric;
