//! Generation requests and their validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// The social or publishing platform content is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Short post, 280 characters.
    Twitter,
    /// Three to five short paragraphs.
    Linkedin,
    /// Caption with line breaks.
    Instagram,
    /// 300 to 500 words.
    Blog,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Self; 4] = [Self::Twitter, Self::Linkedin, Self::Instagram, Self::Blog];

    /// Returns the wire name of the platform.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Twitter => "twitter",
            Self::Linkedin => "linkedin",
            Self::Instagram => "instagram",
            Self::Blog => "blog",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str() == s)
            .ok_or_else(|| {
                "Platform must be one of: twitter, linkedin, instagram, blog".to_string()
            })
    }
}

/// The voice content is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Formal and business-focused.
    Professional,
    /// Conversational and friendly.
    Casual,
    /// Fun and light-hearted.
    Playful,
    /// Expert and fact-driven.
    Authoritative,
}

impl Tone {
    /// Every supported tone.
    pub const ALL: [Self; 4] = [
        Self::Professional,
        Self::Casual,
        Self::Playful,
        Self::Authoritative,
    ];

    /// Returns the wire name of the tone.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Professional => "professional",
            Self::Casual => "casual",
            Self::Playful => "playful",
            Self::Authoritative => "authoritative",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str() == s)
            .ok_or_else(|| {
                "Tone must be one of: professional, casual, playful, authoritative".to_string()
            })
    }
}

const fn default_image_count() -> u32 {
    1
}

/// A validated generation request.
///
/// The pipeline assumes every field is valid; construct it through
/// [`TopicRequestPayload::validate`] when the input comes from outside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequest {
    /// The subject to research and write about.
    pub topic: String,
    /// Target platform.
    pub platform: Platform,
    /// Target tone.
    pub tone: Tone,
    /// Number of images to generate.
    #[serde(default = "default_image_count")]
    pub image_count: u32,
}

impl TopicRequest {
    /// Creates a request with a single image.
    #[must_use]
    pub fn new(topic: impl Into<String>, platform: Platform, tone: Tone) -> Self {
        Self {
            topic: topic.into(),
            platform,
            tone,
            image_count: default_image_count(),
        }
    }

    /// Sets the image count.
    #[must_use]
    pub fn with_image_count(mut self, image_count: u32) -> Self {
        self.image_count = image_count;
        self
    }
}

/// An unvalidated request body as received over HTTP.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRequestPayload {
    /// Raw topic.
    #[serde(default)]
    pub topic: Option<String>,
    /// Raw platform name.
    #[serde(default)]
    pub platform: Option<String>,
    /// Raw tone name.
    #[serde(default)]
    pub tone: Option<String>,
    /// Raw image count; defaults to one when absent.
    #[serde(default)]
    pub image_count: Option<i64>,
}

impl TopicRequestPayload {
    /// Checks every field and returns the typed request, or all field failures.
    pub fn validate(self) -> Result<TopicRequest, ValidationError> {
        let mut errors = ValidationError::new();

        let topic = self.topic.unwrap_or_default();
        if topic.trim().is_empty() {
            errors.add("topic", "Topic is required");
        }

        let platform = match self.platform.as_deref() {
            None => {
                errors.add("platform", "Platform is required");
                None
            }
            Some(raw) => raw
                .parse::<Platform>()
                .map_err(|message| errors.add("platform", message))
                .ok(),
        };

        let tone = match self.tone.as_deref() {
            None => {
                errors.add("tone", "Tone is required");
                None
            }
            Some(raw) => raw
                .parse::<Tone>()
                .map_err(|message| errors.add("tone", message))
                .ok(),
        };

        let image_count = match self.image_count {
            None => Some(default_image_count()),
            Some(count) => match u32::try_from(count) {
                Ok(count) if count > 0 => Some(count),
                _ => {
                    errors.add("imageCount", "Image count must be positive");
                    None
                }
            },
        };

        match (platform, tone, image_count) {
            (Some(platform), Some(tone), Some(image_count)) if errors.is_empty() => {
                Ok(TopicRequest {
                    topic,
                    platform,
                    tone,
                    image_count,
                })
            }
            _ => Err(errors),
        }
    }
}
