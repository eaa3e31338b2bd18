//! Research agent.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, warn};

use super::{parse_reply, prompts, ResearchStage};
use crate::core::ResearchPoints;
use crate::errors::ProviderError;
use crate::observability::SpanTimer;
use crate::pipeline::StageOutcome;
use crate::providers::{ChatModel, WebSearch};
use crate::utils::word_count;

const MAX_QUERIES: usize = 3;
const MAX_SOURCES: usize = 5;
const MAX_POINT_WORDS: usize = 25;

/// Researches a topic with the chat model, optionally grounded in web search.
#[derive(Clone)]
pub struct ResearchAgent {
    chat: Arc<dyn ChatModel>,
    search: Arc<dyn WebSearch>,
}

impl ResearchAgent {
    /// Creates a research agent.
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>, search: Arc<dyn WebSearch>) -> Self {
        Self { chat, search }
    }

    /// The value used when research fails.
    #[must_use]
    pub fn fallback(topic: &str) -> ResearchPoints {
        ResearchPoints::new(vec![format!(
            "Unable to complete research for the topic: {topic}"
        )])
    }

    async fn research_with_search(&self, topic: &str) -> Result<ResearchPoints, ResearchFailure> {
        let reply = self.chat.complete(&prompts::search_queries(topic)).await?;
        let queries = search_queries(&reply, topic);
        debug!(topic, queries = queries.len(), "Generated search queries");

        let mut summaries = String::new();
        let mut web_sources = Vec::new();
        for query in &queries {
            let response = self.search.search(query).await;
            summaries.push_str(&response.to_summary_text());
            summaries.push_str("\n\n");
            web_sources.extend(response.extract_sources());
        }

        let prompt = prompts::full_prompt(
            prompts::RESEARCH_WITH_SEARCH_SYSTEM,
            &prompts::research_user_with_search(topic, &summaries),
        );
        let reply = self.chat.complete(&prompt).await?;
        let parsed: ResearchPoints = parse_reply(&reply)?;
        let sources = merge_sources(parsed.sources, web_sources);
        Ok(ResearchPoints::new(parsed.points).with_sources(sources))
    }

    async fn research_without_search(&self, topic: &str) -> Result<ResearchPoints, ResearchFailure> {
        let prompt = prompts::full_prompt(prompts::RESEARCH_SYSTEM, &prompts::research_user(topic));
        let reply = self.chat.complete(&prompt).await?;
        Ok(parse_reply(&reply)?)
    }
}

impl std::fmt::Debug for ResearchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchAgent")
            .field("search_enabled", &self.search.is_enabled())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ResearchStage for ResearchAgent {
    async fn research(&self, topic: &str) -> StageOutcome<ResearchPoints> {
        let timer = SpanTimer::start("research_agent");
        let attempt = if self.search.is_enabled() {
            self.research_with_search(topic).await
        } else {
            self.research_without_search(topic).await
        };
        timer.finish();

        match attempt {
            Ok(points) => {
                warn_on_constraints(&points);
                debug!(
                    topic,
                    points = points.points.len(),
                    sources = points.sources.len(),
                    "Research completed"
                );
                StageOutcome::Success(points)
            }
            Err(e) => {
                error!(topic, error = %e, "Research failed, using fallback");
                StageOutcome::fallback(Self::fallback(topic), e.to_string())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum ResearchFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("could not parse research reply: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Takes up to three non-blank lines from the reply, or default queries.
fn search_queries(reply: &str, topic: &str) -> Vec<String> {
    let queries: Vec<String> = reply
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_QUERIES)
        .map(ToString::to_string)
        .collect();
    if queries.is_empty() {
        vec![
            topic.to_string(),
            format!("{topic} latest news"),
            format!("{topic} facts statistics"),
        ]
    } else {
        queries
    }
}

/// Model-cited sources first, then web sources, deduplicated and capped.
fn merge_sources(mut sources: Vec<String>, web_sources: Vec<String>) -> Vec<String> {
    for source in web_sources {
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    sources.truncate(MAX_SOURCES);
    sources
}

fn warn_on_constraints(research: &ResearchPoints) {
    let count = research.points.len();
    if !(5..=7).contains(&count) {
        warn!(count, "Research point count outside expected range 5-7");
    }
    for point in &research.points {
        if word_count(point) > MAX_POINT_WORDS {
            warn!(point = %point, "Research point exceeds 25 words");
        }
    }
}
