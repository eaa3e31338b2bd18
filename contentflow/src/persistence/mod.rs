//! Storage of finished generation results.

mod memory;

pub use memory::InMemoryContentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{OrchestrationResult, TopicRequest};
use crate::errors::PersistenceError;

/// A persisted pipeline result owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    /// Store-assigned id.
    pub id: i64,
    /// Email of the owning user.
    pub owner_email: String,
    /// Requested topic.
    pub topic: String,
    /// Requested platform.
    pub platform: String,
    /// Requested tone.
    pub tone: String,
    /// Requested number of images.
    pub image_count: u32,
    /// Research bullet points.
    pub research_points: Vec<String>,
    /// Research sources.
    pub sources: Vec<String>,
    /// Draft headline.
    pub headline: String,
    /// Draft body.
    pub body: String,
    /// Draft call to action.
    pub cta: String,
    /// Prompt the images were generated from.
    pub image_prompt: String,
    /// Remote image URLs.
    pub image_urls: Vec<String>,
    /// Local copies, or remote URLs when not downloaded.
    pub local_image_paths: Vec<String>,
    /// Public URLs of local copies.
    pub local_image_urls: Vec<String>,
    /// When the record was saved.
    pub created_at: DateTime<Utc>,
}

impl GeneratedContent {
    /// Flattens a request and its result into a record.
    #[must_use]
    pub fn from_result(
        id: i64,
        owner_email: &str,
        request: &TopicRequest,
        result: &OrchestrationResult,
    ) -> Self {
        Self {
            id,
            owner_email: owner_email.to_string(),
            topic: request.topic.clone(),
            platform: request.platform.to_string(),
            tone: request.tone.to_string(),
            image_count: request.image_count,
            research_points: result.research.points.clone(),
            sources: result.research.sources.clone(),
            headline: result.content.headline.clone(),
            body: result.content.body.clone(),
            cta: result.content.cta.clone(),
            image_prompt: result.image.prompt.clone(),
            image_urls: result.image.open_ai_image_urls.clone(),
            local_image_paths: result.image.local_image_paths.clone(),
            local_image_urls: result.image.local_image_urls.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Persists generation results on behalf of a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Stores a result and returns its id.
    ///
    /// Fails with [`PersistenceError::UserNotFound`] for unknown users.
    async fn save(
        &self,
        user_email: &str,
        request: &TopicRequest,
        result: &OrchestrationResult,
    ) -> Result<i64, PersistenceError>;

    /// Looks up one record owned by `user_email`.
    async fn find_by_id(&self, id: i64, user_email: &str) -> Result<GeneratedContent, PersistenceError>;

    /// Lists every record owned by `user_email`, newest first.
    async fn list_for_user(&self, user_email: &str) -> Result<Vec<GeneratedContent>, PersistenceError>;

    /// Deletes one record owned by `user_email`.
    async fn delete(&self, id: i64, user_email: &str) -> Result<(), PersistenceError>;
}
