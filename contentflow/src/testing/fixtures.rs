//! Sample values and ready-made pipelines.

use std::sync::Arc;

use super::{FixedStage, ScriptedChatModel, StaticImageModel};
use crate::config::ImageStorageConfig;
use crate::core::{ContentDraft, ImageResult, Platform, ResearchPoints, Tone, TopicRequest};
use crate::errors::ProviderError;
use crate::events::NoOpEventSink;
use crate::pipeline::Orchestrator;
use crate::providers::{ChatModel, DisabledSearch, ImageModel, ImageTool};
use crate::stages::{ContentAgent, ImageAgent, ResearchAgent};

/// `AI` for twitter in a casual tone, one image.
#[must_use]
pub fn sample_request() -> TopicRequest {
    TopicRequest::new("AI", Platform::Twitter, Tone::Casual)
}

/// Five research points with one source.
#[must_use]
pub fn sample_research() -> ResearchPoints {
    ResearchPoints::new(
        (1..=5)
            .map(|n| format!("Fact number {n} about the topic."))
            .collect(),
    )
    .with_sources(vec!["https://example.com/source".to_string()])
}

/// A short twitter draft.
#[must_use]
pub fn sample_draft() -> ContentDraft {
    ContentDraft {
        platform: "twitter".to_string(),
        tone: "casual".to_string(),
        headline: "Sample headline".to_string(),
        body: "Sample body #AI".to_string(),
        cta: "Reply below".to_string(),
    }
}

/// One remote image.
#[must_use]
pub fn sample_image() -> ImageResult {
    ImageResult {
        open_ai_image_urls: vec!["https://images.test/1.png".to_string()],
        local_image_paths: vec!["https://images.test/1.png".to_string()],
        ..ImageResult::with_prompt("Sample image prompt")
    }
}

/// An orchestrator whose stages return the sample values.
#[must_use]
pub fn fixed_orchestrator() -> Orchestrator {
    let stage = Arc::new(FixedStage::new(sample_research(), sample_draft(), sample_image()));
    Orchestrator::new(stage.clone(), stage.clone(), stage).with_event_sink(Arc::new(NoOpEventSink))
}

/// An orchestrator running the real agents against the given models, with
/// search and image downloads disabled.
pub fn agent_orchestrator(
    chat: Arc<dyn ChatModel>,
    images: Arc<dyn ImageModel>,
) -> Result<Orchestrator, ProviderError> {
    let tool = ImageTool::new(images, &ImageStorageConfig::default().without_download())?;
    Ok(Orchestrator::new(
        Arc::new(ResearchAgent::new(Arc::clone(&chat), Arc::new(DisabledSearch))),
        Arc::new(ContentAgent::new(Arc::clone(&chat))),
        Arc::new(ImageAgent::new(chat, tool)),
    )
    .with_event_sink(Arc::new(NoOpEventSink)))
}

/// [`agent_orchestrator`] with the happy-path script and static images.
pub fn happy_orchestrator() -> Result<Orchestrator, ProviderError> {
    agent_orchestrator(
        Arc::new(ScriptedChatModel::happy_path()),
        Arc::new(StaticImageModel::default()),
    )
}
