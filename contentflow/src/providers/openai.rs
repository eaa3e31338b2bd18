//! OpenAI chat completions and image generation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, error};

use super::{ChatModel, ImageModel};
use crate::config::OpenAiConfig;
use crate::errors::ProviderError;
use crate::utils::elapsed_millis;

const PROVIDER: &str = "openai";
const IMAGE_SIZE: &str = "1024x1024";

/// OpenAI REST client.
///
/// Chat and image calls use separate HTTP clients so each has its own
/// timeout.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    chat_client: reqwest::Client,
    image_client: reqwest::Client,
    base_url: String,
    text_model: String,
    image_model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    /// Creates a client from configuration.
    pub fn new(config: &OpenAiConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| ProviderError::config("Invalid API key format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        let build = |timeout| {
            reqwest::Client::builder()
                .timeout(timeout)
                .default_headers(headers.clone())
                .build()
                .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))
        };

        Ok(Self {
            chat_client: build(config.timeout())?,
            image_client: build(config.image_timeout())?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn images_url(&self) -> String {
        format!("{}/images/generations", self.base_url)
    }

    async fn post<B, R>(&self, client: &reqwest::Client, url: String, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let response = client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, &e))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .ok()
                .and_then(|envelope| envelope.error)
                .and_then(|error| error.message)
                .unwrap_or(text);
            error!(status = status.as_u16(), %message, "OpenAI API error");
            return Err(ProviderError::status(PROVIDER, status.as_u16(), message));
        }

        serde_json::from_str(&text).map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))
    }
}

#[derive(Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: [ApiMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'static str,
}

#[derive(Deserialize)]
struct ImageApiResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let start = Instant::now();
        let request = ChatApiRequest {
            model: &self.text_model,
            messages: [ApiMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response: ChatApiResponse = self.post(&self.chat_client, self.chat_url(), &request).await?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| ProviderError::invalid_response(PROVIDER, "response has no message content"))?;

        debug!(
            model = %self.text_model,
            duration_ms = elapsed_millis(start),
            chars = content.len(),
            "Chat completion received"
        );
        Ok(content)
    }
}

#[async_trait]
impl ImageModel for OpenAiClient {
    async fn generate_images(&self, prompt: &str, count: u32) -> Result<Vec<String>, ProviderError> {
        let start = Instant::now();
        let request = ImageApiRequest {
            model: &self.image_model,
            prompt,
            n: count,
            size: IMAGE_SIZE,
        };

        let response: ImageApiResponse = self.post(&self.image_client, self.images_url(), &request).await?;
        let urls: Vec<String> = response.data.into_iter().filter_map(|image| image.url).collect();
        if urls.is_empty() {
            return Err(ProviderError::invalid_response(PROVIDER, "response has no image URLs"));
        }

        debug!(
            model = %self.image_model,
            duration_ms = elapsed_millis(start),
            images = urls.len(),
            "Images generated"
        );
        Ok(urls)
    }
}
