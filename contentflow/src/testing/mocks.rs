//! Stage fakes.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{ContentDraft, ImageResult, Platform, ResearchPoints, Tone};
use crate::pipeline::StageOutcome;
use crate::stages::{ContentStage, ImageStage, ResearchStage};

/// A stage that returns fixed values for every call.
#[derive(Debug, Clone, Default)]
pub struct FixedStage {
    research: ResearchPoints,
    content: ContentDraft,
    image: ImageResult,
}

impl FixedStage {
    /// Creates a stage returning the given values.
    #[must_use]
    pub fn new(research: ResearchPoints, content: ContentDraft, image: ImageResult) -> Self {
        Self {
            research,
            content,
            image,
        }
    }
}

#[async_trait]
impl ResearchStage for FixedStage {
    async fn research(&self, _topic: &str) -> StageOutcome<ResearchPoints> {
        StageOutcome::Success(self.research.clone())
    }
}

#[async_trait]
impl ContentStage for FixedStage {
    async fn create_content(
        &self,
        _research: &ResearchPoints,
        _platform: Platform,
        _tone: Tone,
    ) -> StageOutcome<ContentDraft> {
        StageOutcome::Success(self.content.clone())
    }
}

#[async_trait]
impl ImageStage for FixedStage {
    async fn generate_image(
        &self,
        _content: &ContentDraft,
        _image_count: u32,
        _topic: &str,
    ) -> StageOutcome<ImageResult> {
        StageOutcome::Success(self.image.clone())
    }
}

/// A stage that panics on every call.
#[derive(Debug, Clone)]
pub struct PanickingStage {
    message: String,
}

impl PanickingStage {
    /// Creates a stage panicking with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ResearchStage for PanickingStage {
    async fn research(&self, _topic: &str) -> StageOutcome<ResearchPoints> {
        panic!("{}", self.message)
    }
}

#[async_trait]
impl ContentStage for PanickingStage {
    async fn create_content(
        &self,
        _research: &ResearchPoints,
        _platform: Platform,
        _tone: Tone,
    ) -> StageOutcome<ContentDraft> {
        panic!("{}", self.message)
    }
}

#[async_trait]
impl ImageStage for PanickingStage {
    async fn generate_image(
        &self,
        _content: &ContentDraft,
        _image_count: u32,
        _topic: &str,
    ) -> StageOutcome<ImageResult> {
        panic!("{}", self.message)
    }
}

/// A content stage that records the research it was given.
#[derive(Debug, Default)]
pub struct RecordingContentStage {
    seen: Mutex<Vec<ResearchPoints>>,
    reply: ContentDraft,
}

impl RecordingContentStage {
    /// Creates a stage that replies with `reply`.
    #[must_use]
    pub fn new(reply: ContentDraft) -> Self {
        Self {
            seen: Mutex::new(Vec::new()),
            reply,
        }
    }

    /// Returns the research passed to each call.
    #[must_use]
    pub fn seen(&self) -> Vec<ResearchPoints> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl ContentStage for RecordingContentStage {
    async fn create_content(
        &self,
        research: &ResearchPoints,
        _platform: Platform,
        _tone: Tone,
    ) -> StageOutcome<ContentDraft> {
        self.seen.lock().push(research.clone());
        StageOutcome::Success(self.reply.clone())
    }
}
