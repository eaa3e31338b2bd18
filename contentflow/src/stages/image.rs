//! Image agent.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{parse_reply, prompts, ImageStage};
use crate::core::{ContentDraft, ImageBrief, ImageResult};
use crate::observability::SpanTimer;
use crate::pipeline::StageOutcome;
use crate::providers::{ChatModel, ImageTool};

/// Writes an image prompt for a draft and generates the images.
#[derive(Clone)]
pub struct ImageAgent {
    chat: Arc<dyn ChatModel>,
    tool: ImageTool,
}

impl ImageAgent {
    /// Creates an image agent.
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>, tool: ImageTool) -> Self {
        Self { chat, tool }
    }

    /// The value used when image generation fails.
    #[must_use]
    pub fn fallback(content: &ContentDraft) -> ImageResult {
        ImageResult::with_prompt(format!(
            "Image generation failed for content: {}",
            content.headline
        ))
    }

    /// Asks the chat model for a brief. Never fails.
    async fn brief(&self, content: &ContentDraft) -> ImageBrief {
        let prompt = prompts::full_prompt(prompts::IMAGE_SYSTEM, &prompts::image_user(content));
        let parsed = match self.chat.complete(&prompt).await {
            Ok(reply) => parse_reply::<ImageBrief>(&reply).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(brief) if brief.prompt.trim().is_empty() => {
                warn!("Generated image prompt is empty, using fallback");
                ImageBrief {
                    prompt: format!("Abstract illustration related to: {}", content.headline),
                }
            }
            Ok(brief) => brief,
            Err(e) => {
                error!(error = %e, "Image brief generation failed, using fallback");
                ImageBrief {
                    prompt: format!("Professional illustration for: {}", content.headline),
                }
            }
        }
    }
}

impl std::fmt::Debug for ImageAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAgent")
            .field("tool", &self.tool)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageStage for ImageAgent {
    async fn generate_image(
        &self,
        content: &ContentDraft,
        image_count: u32,
        topic: &str,
    ) -> StageOutcome<ImageResult> {
        let timer = SpanTimer::start("image_agent");
        debug!(image_count, "Generating images for content");
        let brief = self.brief(content).await;
        debug!(prompt = %brief.prompt, "Image brief ready");
        let attempt = self.tool.generate(&brief.prompt, image_count, topic).await;
        timer.finish();

        match attempt {
            Ok(result) => {
                debug!(
                    remote = result.open_ai_image_urls.len(),
                    local = result.local_image_paths.len(),
                    "Image generation completed"
                );
                StageOutcome::Success(result)
            }
            Err(e) => {
                error!(error = %e, "Image generation failed, using fallback");
                StageOutcome::fallback(Self::fallback(content), e.to_string())
            }
        }
    }
}
