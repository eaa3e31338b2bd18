//! Image generation plus local storage.

use std::sync::Arc;
use tracing::debug;

use super::{ImageDownloader, ImageModel};
use crate::config::ImageStorageConfig;
use crate::core::ImageResult;
use crate::errors::ProviderError;

/// Generates images and records where they can be fetched from.
#[derive(Clone)]
pub struct ImageTool {
    model: Arc<dyn ImageModel>,
    downloader: ImageDownloader,
    keep_remote_url: bool,
    base_url: String,
}

impl ImageTool {
    /// Creates a tool from an image model and storage settings.
    pub fn new(model: Arc<dyn ImageModel>, config: &ImageStorageConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            model,
            downloader: ImageDownloader::new(config)?,
            keep_remote_url: config.keep_remote_url,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Generates `count` images for `prompt`, naming local copies after `topic`.
    pub async fn generate(&self, prompt: &str, count: u32, topic: &str) -> Result<ImageResult, ProviderError> {
        debug!(count, prompt, "Generating images");
        let remote_urls = self.model.generate_images(prompt, count).await?;

        let mut local_image_paths = Vec::with_capacity(remote_urls.len());
        let mut local_image_urls = Vec::new();
        for url in &remote_urls {
            let downloaded = self.downloader.download(url, topic).await;
            if let Some(filename) = &downloaded.filename {
                local_image_urls.push(format!("{}/generated-image/{filename}", self.base_url));
            }
            local_image_paths.push(downloaded.local_path);
        }

        Ok(ImageResult {
            prompt: prompt.to_string(),
            open_ai_image_urls: if self.keep_remote_url {
                remote_urls
            } else {
                Vec::new()
            },
            local_image_paths,
            local_image_urls,
        })
    }
}

impl std::fmt::Debug for ImageTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageTool")
            .field("downloader", &self.downloader)
            .field("keep_remote_url", &self.keep_remote_url)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockImageModel;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_without_download_keeps_remote_urls() {
        let mut model = MockImageModel::new();
        model
            .expect_generate_images()
            .with(eq("a cat"), eq(2_u32))
            .returning(|_, _| Ok(vec!["https://img/1".to_string(), "https://img/2".to_string()]));
        let tool = ImageTool::new(
            Arc::new(model),
            &ImageStorageConfig::default().without_download(),
        )
        .unwrap();

        let result = tool.generate("a cat", 2, "cats").await.unwrap();

        assert_eq!(result.prompt, "a cat");
        assert_eq!(result.open_ai_image_urls.len(), 2);
        assert_eq!(result.local_image_paths, result.open_ai_image_urls);
        assert!(result.local_image_urls.is_empty());
    }

    #[tokio::test]
    async fn test_generate_with_download_builds_public_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 4]))
            .mount(&server)
            .await;
        let remote = format!("{}/img.png", server.uri());
        let mut model = MockImageModel::new();
        let returned = remote.clone();
        model
            .expect_generate_images()
            .returning(move |_, _| Ok(vec![returned.clone()]));
        let dir = tempfile::tempdir().unwrap();
        let mut config = ImageStorageConfig::default().with_storage_path(dir.path());
        config.keep_remote_url = false;
        config.base_url = "http://cdn.local/".to_string();
        let tool = ImageTool::new(Arc::new(model), &config).unwrap();

        let result = tool.generate("a dog", 1, "dogs").await.unwrap();

        assert!(result.open_ai_image_urls.is_empty());
        assert_eq!(result.local_image_urls.len(), 1);
        assert!(result.local_image_urls[0].starts_with("http://cdn.local/generated-image/"));
        assert!(result.local_image_urls[0].contains("_dogs_"));
        assert_ne!(result.local_image_paths[0], remote);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let mut model = MockImageModel::new();
        model
            .expect_generate_images()
            .returning(|_, _| Err(ProviderError::status("openai", 500, "down")));
        let tool = ImageTool::new(
            Arc::new(model),
            &ImageStorageConfig::default().without_download(),
        )
        .unwrap();

        assert!(tool.generate("x", 1, "x").await.is_err());
    }
}
