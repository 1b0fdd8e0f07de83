//! Pipeline orchestration module.

mod orchestrator;
mod progress;
mod report;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
