//! Capture-to-prediction pipeline.

mod orchestrator;
mod phase;

pub use orchestrator::{PipelineHandle, PipelineOptions, Status, spawn};
pub use phase::{FailureReason, Phase, PhaseEvent};

#[cfg(test)]
mod tests;
