//! Pipeline orchestration.
//!
//! A run threads a [`PipelineState`] through the research, content and image
//! stages. Stage agents report [`StageOutcome`] values; the [`Orchestrator`]
//! only guards against panics.

mod orchestrator;
mod outcome;
mod state;

#[cfg(test)]
mod integration_tests;

pub use orchestrator::Orchestrator;
pub use outcome::{StageName, StageOutcome};
pub use state::PipelineState;
