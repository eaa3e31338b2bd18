//! Content agent.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{parse_reply, prompts, ContentStage};
use crate::core::{ContentDraft, Platform, ResearchPoints, Tone};
use crate::errors::ProviderError;
use crate::observability::SpanTimer;
use crate::pipeline::StageOutcome;
use crate::providers::ChatModel;
use crate::utils::word_count;

/// Drafts platform-specific copy from research points.
#[derive(Clone)]
pub struct ContentAgent {
    chat: Arc<dyn ChatModel>,
}

impl ContentAgent {
    /// Creates a content agent.
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }

    /// The value used when drafting fails. Platform and tone are preserved.
    #[must_use]
    pub fn fallback(platform: Platform, tone: Tone) -> ContentDraft {
        ContentDraft {
            platform: platform.to_string(),
            tone: tone.to_string(),
            headline: "Content Creation Error".to_string(),
            body: "Unable to generate content based on the research provided.".to_string(),
            cta: "Please try again.".to_string(),
        }
    }

    async fn draft(
        &self,
        research: &ResearchPoints,
        platform: Platform,
        tone: Tone,
    ) -> Result<ContentDraft, DraftFailure> {
        let prompt = prompts::full_prompt(
            prompts::CONTENT_SYSTEM,
            &prompts::content_user(research, platform, tone),
        );
        let reply = self.chat.complete(&prompt).await?;
        Ok(parse_reply(&reply)?)
    }
}

impl std::fmt::Debug for ContentAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentAgent").finish_non_exhaustive()
    }
}

#[async_trait]
impl ContentStage for ContentAgent {
    async fn create_content(
        &self,
        research: &ResearchPoints,
        platform: Platform,
        tone: Tone,
    ) -> StageOutcome<ContentDraft> {
        let timer = SpanTimer::start("content_agent");
        debug!(%platform, %tone, "Creating content");
        let attempt = self.draft(research, platform, tone).await;
        timer.finish();

        match attempt {
            Ok(draft) => {
                warn_on_platform_constraints(&draft, platform);
                StageOutcome::Success(draft)
            }
            Err(e) => {
                error!(%platform, error = %e, "Content creation failed, using fallback");
                StageOutcome::fallback(Self::fallback(platform, tone), e.to_string())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DraftFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("could not parse content reply: {0}")]
    Parse(#[from] serde_json::Error),
}

fn warn_on_platform_constraints(draft: &ContentDraft, platform: Platform) {
    match platform {
        Platform::Twitter => {
            let total = format!("{} {} {}", draft.headline, draft.body, draft.cta)
                .chars()
                .count();
            if total > 280 {
                warn!(chars = total, "Twitter content exceeds 280 characters");
            }
        }
        Platform::Blog => {
            let words = word_count(&draft.body);
            if !(300..=500).contains(&words) {
                warn!(words, "Blog word count outside expected range 300-500");
            }
        }
        Platform::Linkedin => {
            let paragraphs = draft.body.split("\n\n").count();
            if !(3..=5).contains(&paragraphs) {
                warn!(paragraphs, "LinkedIn content should have 3-5 paragraphs");
            }
        }
        Platform::Instagram => {
            if !draft.body.contains('\n') {
                warn!("Instagram content should contain line breaks");
            }
        }
    }
}
