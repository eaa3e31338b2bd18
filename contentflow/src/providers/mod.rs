//! External model, image and search providers.
//!
//! Stage agents only see the [`ChatModel`], [`ImageModel`] and [`WebSearch`]
//! traits. The HTTP implementations talk to the OpenAI and SerpAPI REST APIs.

mod cache;
mod downloader;
mod image_tool;
mod openai;
mod search;

pub use cache::CachedSearch;
pub use downloader::{DownloadedImage, ImageDownloader};
pub use image_tool::ImageTool;
pub use openai::OpenAiClient;
pub use search::{DisabledSearch, SearchResult, SerpApiSearch, WebSearchResponse};

use async_trait::async_trait;

use crate::errors::ProviderError;

/// A text completion model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends a single prompt and returns the model's reply.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// An image generation model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Generates `count` images and returns their URLs.
    async fn generate_images(&self, prompt: &str, count: u32) -> Result<Vec<String>, ProviderError>;
}

/// A web search backend.
///
/// Searches never fail outward; problems produce an empty response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Returns true if searches will hit a real backend.
    fn is_enabled(&self) -> bool;

    /// Runs one query.
    async fn search(&self, query: &str) -> WebSearchResponse;
}
