//! Stage traits and the agents that implement them.
//!
//! A stage never fails outward. Provider or parsing errors are turned into
//! a [`StageOutcome::Fallback`] carrying a substitute value, so the pipeline
//! always has something to pass to the next stage.

mod content;
mod image;
mod json;
pub mod prompts;
mod research;

pub use content::ContentAgent;
pub use image::ImageAgent;
pub use json::{extract_json, parse_reply};
pub use research::ResearchAgent;

use async_trait::async_trait;

use crate::core::{ContentDraft, ImageResult, Platform, ResearchPoints, Tone};
use crate::pipeline::StageOutcome;

/// Produces research points for a topic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResearchStage: Send + Sync {
    /// Researches `topic`.
    async fn research(&self, topic: &str) -> StageOutcome<ResearchPoints>;
}

/// Turns research into a platform-specific draft.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStage: Send + Sync {
    /// Drafts content for `platform` in `tone`.
    async fn create_content(
        &self,
        research: &ResearchPoints,
        platform: Platform,
        tone: Tone,
    ) -> StageOutcome<ContentDraft>;
}

/// Generates images for a draft.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStage: Send + Sync {
    /// Generates `image_count` images illustrating `content`.
    async fn generate_image(
        &self,
        content: &ContentDraft,
        image_count: u32,
        topic: &str,
    ) -> StageOutcome<ImageResult>;
}
