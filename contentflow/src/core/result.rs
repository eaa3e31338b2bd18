//! Stage outputs and the assembled pipeline result.

use serde::{Deserialize, Serialize};

/// Research bullet points and the sources they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchPoints {
    /// Short factual statements.
    #[serde(default)]
    pub points: Vec<String>,
    /// Source URLs, possibly empty.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl ResearchPoints {
    /// Creates research points without sources.
    #[must_use]
    pub fn new(points: Vec<String>) -> Self {
        Self {
            points,
            sources: Vec::new(),
        }
    }

    /// Sets the sources.
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    /// Returns true if there are neither points nor sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.sources.is_empty()
    }
}

/// A platform-specific draft.
///
/// `platform` and `tone` are kept as text because they are echoed back by the
/// language model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentDraft {
    /// Platform the draft targets.
    #[serde(default)]
    pub platform: String,
    /// Tone the draft is written in.
    #[serde(default)]
    pub tone: String,
    /// Headline or hook.
    #[serde(default)]
    pub headline: String,
    /// Main text.
    #[serde(default)]
    pub body: String,
    /// Call to action.
    #[serde(default)]
    pub cta: String,
}

impl ContentDraft {
    /// Returns true if every field is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platform.is_empty()
            && self.tone.is_empty()
            && self.headline.is_empty()
            && self.body.is_empty()
            && self.cta.is_empty()
    }
}

/// A prompt describing the image to generate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBrief {
    /// The image prompt.
    #[serde(default)]
    pub prompt: String,
}

/// Generated images, remote and local.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    /// Prompt the images were generated from.
    #[serde(default)]
    pub prompt: String,
    /// URLs returned by the image API.
    #[serde(default)]
    pub open_ai_image_urls: Vec<String>,
    /// Local file paths, or the remote URL when no local copy exists.
    #[serde(default)]
    pub local_image_paths: Vec<String>,
    /// HTTP URLs for locally stored copies.
    #[serde(default)]
    pub local_image_urls: Vec<String>,
}

impl ImageResult {
    /// Creates a result carrying only a prompt.
    #[must_use]
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Returns true if there is no prompt and no image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prompt.is_empty()
            && self.open_ai_image_urls.is_empty()
            && self.local_image_paths.is_empty()
            && self.local_image_urls.is_empty()
    }
}

/// The immutable output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationResult {
    /// The requested topic.
    pub topic: String,
    /// Research stage output.
    pub research: ResearchPoints,
    /// Content stage output.
    pub content: ContentDraft,
    /// Image stage output.
    pub image: ImageResult,
    /// Identifier of the persisted record, once saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl OrchestrationResult {
    /// Creates a result with every slot empty.
    #[must_use]
    pub fn empty(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            research: ResearchPoints::default(),
            content: ContentDraft::default(),
            image: ImageResult::default(),
            id: None,
        }
    }

    /// Returns a copy carrying the persisted id.
    #[must_use]
    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// Returns true if no stage contributed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.research.is_empty() && self.content.is_empty() && self.image.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_result_has_empty_slots() {
        let result = OrchestrationResult::empty("AI");

        assert_eq!(result.topic, "AI");
        assert!(result.research.points.is_empty());
        assert!(result.research.sources.is_empty());
        assert!(result.content.is_empty());
        assert_eq!(result.image.prompt, "");
        assert!(result.image.open_ai_image_urls.is_empty());
        assert!(result.is_empty());
        assert_eq!(result.id, None);
    }

    #[test]
    fn test_empty_result_serialization_round_trip() {
        let result = OrchestrationResult::empty("AI");
        let json = serde_json::to_value(&result).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["image"]["openAiImageUrls"], serde_json::json!([]));
        assert_eq!(json["content"]["headline"], "");

        let back: OrchestrationResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_with_id_leaves_original_untouched() {
        let original = OrchestrationResult::empty("AI");
        let saved = original.with_id(42);

        assert_eq!(original.id, None);
        assert_eq!(saved.id, Some(42));
        assert_eq!(serde_json::to_value(&saved).unwrap()["id"], 42);
    }

    #[test]
    fn test_draft_parses_with_missing_fields() {
        let draft: ContentDraft =
            serde_json::from_str(r#"{"headline": "Hi", "body": "There"}"#).unwrap();

        assert_eq!(draft.headline, "Hi");
        assert_eq!(draft.cta, "");
        assert!(!draft.is_empty());
    }
}
