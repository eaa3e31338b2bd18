//! Core data model: requests, stage outputs, task records and status.

mod request;
mod result;
mod status;
mod task;

pub use request::{Platform, Tone, TopicRequest, TopicRequestPayload};
pub use result::{ContentDraft, ImageBrief, ImageResult, OrchestrationResult, ResearchPoints};
pub use status::TaskStatus;
pub use task::GenerationTask;
