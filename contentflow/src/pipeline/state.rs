//! Per-run working state.

use crate::core::{
    ContentDraft, ImageResult, OrchestrationResult, Platform, ResearchPoints, Tone, TopicRequest,
};

/// Working state of one pipeline run.
///
/// Owned by the run that created it; stage slots start empty and are
/// overwritten as stages finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineState {
    /// The requested topic.
    pub topic: String,
    /// Target platform.
    pub platform: Platform,
    /// Target tone.
    pub tone: Tone,
    /// Number of images to generate.
    pub image_count: u32,
    /// Research slot.
    pub research: ResearchPoints,
    /// Content slot.
    pub content: ContentDraft,
    /// Image slot.
    pub image: ImageResult,
}

impl PipelineState {
    /// Creates a state with empty slots.
    #[must_use]
    pub fn from_request(request: &TopicRequest) -> Self {
        Self {
            topic: request.topic.clone(),
            platform: request.platform,
            tone: request.tone,
            image_count: request.image_count,
            research: ResearchPoints::default(),
            content: ContentDraft::default(),
            image: ImageResult::default(),
        }
    }

    /// Consumes the state into the run result.
    #[must_use]
    pub fn into_result(self) -> OrchestrationResult {
        OrchestrationResult {
            topic: self.topic,
            research: self.research,
            content: self.content,
            image: self.image,
            id: None,
        }
    }
}
