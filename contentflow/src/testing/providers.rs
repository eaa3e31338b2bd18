//! Scripted provider fakes.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{ChatModel, ImageModel, WebSearch, WebSearchResponse};

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Error(String),
}

/// A chat model that answers by matching substrings of the prompt.
///
/// Rules are checked in the order they were added. Unmatched prompts get an
/// error so a missing rule shows up as a fallback.
#[derive(Debug, Default)]
pub struct ScriptedChatModel {
    rules: Vec<(String, Reply)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChatModel {
    /// Creates a model with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every stage prompt with well-formed JSON.
    #[must_use]
    pub fn happy_path() -> Self {
        Self::new()
            .on("Research the topic:", RESEARCH_REPLY)
            .on("Transform this research into", CONTENT_REPLY)
            .on("Create an image prompt", IMAGE_REPLY)
    }

    /// Replies with `reply` when the prompt contains `needle`.
    #[must_use]
    pub fn on(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Text(reply.into())));
        self
    }

    /// Fails when the prompt contains `needle`.
    #[must_use]
    pub fn on_error(mut self, needle: impl Into<String>, message: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Error(message.into())));
        self
    }

    /// Replaces any earlier rule for `needle` with a failure.
    #[must_use]
    pub fn failing(mut self, needle: &str, message: impl Into<String>) -> Self {
        self.rules.retain(|(existing, _)| existing != needle);
        self.on_error(needle, message)
    }

    /// Returns every prompt received, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());
        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Error(message)) => Err(ProviderError::status("scripted", 500, message)),
            None => Err(ProviderError::invalid_response("scripted", "no rule matched prompt")),
        }
    }
}

const RESEARCH_REPLY: &str = r#"```json
{
  "points": [
    "Artificial intelligence systems perform tasks that normally require human intelligence.",
    "Machine learning lets systems improve from data without explicit programming.",
    "Deep learning uses layered neural networks to model complex patterns.",
    "AI is used in image recognition, language processing and autonomous vehicles.",
    "Responsible AI development focuses on fairness, transparency and safety."
  ],
  "sources": []
}
```"#;

const CONTENT_REPLY: &str = r#"{
  "platform": "twitter",
  "tone": "casual",
  "headline": "AI is everywhere",
  "body": "From your phone camera to your inbox, AI quietly does the heavy lifting. #AI",
  "cta": "What's your favourite AI tool?"
}"#;

const IMAGE_REPLY: &str =
    r#"{"prompt": "Friendly robot helping people in a bright modern city, flat vector illustration, no text"}"#;

/// An image model that returns numbered URLs.
#[derive(Debug, Clone)]
pub struct StaticImageModel {
    base_url: String,
}

impl StaticImageModel {
    /// Creates a model returning `{base_url}/{n}.png`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl Default for StaticImageModel {
    fn default() -> Self {
        Self::new("https://images.test")
    }
}

#[async_trait]
impl ImageModel for StaticImageModel {
    async fn generate_images(&self, _prompt: &str, count: u32) -> Result<Vec<String>, ProviderError> {
        Ok((1..=count)
            .map(|n| format!("{}/{n}.png", self.base_url))
            .collect())
    }
}

/// An image model that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingImageModel;

#[async_trait]
impl ImageModel for FailingImageModel {
    async fn generate_images(&self, _prompt: &str, _count: u32) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::status("scripted", 503, "image service unavailable"))
    }
}

/// A search backend that returns the same response for every query.
#[derive(Debug, Clone, Default)]
pub struct StaticSearch {
    response: WebSearchResponse,
}

impl StaticSearch {
    /// Creates a backend returning `response` with the query filled in.
    #[must_use]
    pub fn new(response: WebSearchResponse) -> Self {
        Self { response }
    }
}

#[async_trait]
impl WebSearch for StaticSearch {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn search(&self, query: &str) -> WebSearchResponse {
        WebSearchResponse {
            query: query.to_string(),
            ..self.response.clone()
        }
    }
}
