//! Test doubles for contentflow.
//!
//! This module provides:
//! - Scripted chat, image and search providers
//! - Fixed and panicking stages
//! - Sample values and ready-made orchestrators

mod fixtures;
mod mocks;
mod providers;

pub use fixtures::{
    agent_orchestrator, fixed_orchestrator, happy_orchestrator, sample_draft, sample_image,
    sample_request, sample_research,
};
pub use mocks::{FixedStage, PanickingStage, RecordingContentStage};
pub use providers::{FailingImageModel, ScriptedChatModel, StaticImageModel, StaticSearch};
