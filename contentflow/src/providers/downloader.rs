//! Local copies of generated images.

use chrono::Local;
use std::path::PathBuf;
use tracing::{debug, error, info};

use crate::config::ImageStorageConfig;
use crate::errors::ProviderError;

const PROVIDER: &str = "image-download";

/// Where a generated image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedImage {
    /// Absolute local path, or the remote URL when no copy was made.
    pub local_path: String,
    /// File name inside the storage directory, when a copy was made.
    pub filename: Option<String>,
}

impl DownloadedImage {
    fn remote(url: &str) -> Self {
        Self {
            local_path: url.to_string(),
            filename: None,
        }
    }
}

/// Downloads generated images into the storage directory.
#[derive(Debug, Clone)]
pub struct ImageDownloader {
    client: reqwest::Client,
    enabled: bool,
    storage_path: PathBuf,
}

impl ImageDownloader {
    /// Creates a downloader from configuration.
    pub fn new(config: &ImageStorageConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout())
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            enabled: config.download_enabled,
            storage_path: config.storage_path.clone(),
        })
    }

    /// Returns true if downloads are performed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Creates the storage directory if downloads are enabled.
    pub async fn prepare(&self) -> std::io::Result<()> {
        if self.enabled {
            tokio::fs::create_dir_all(&self.storage_path).await?;
            info!(path = %self.storage_path.display(), "Image storage directory ready");
        }
        Ok(())
    }

    /// Downloads one image. Any failure falls back to the remote URL.
    pub async fn download(&self, url: &str, topic: &str) -> DownloadedImage {
        if !self.enabled {
            debug!("Image download disabled, keeping remote URL");
            return DownloadedImage::remote(url);
        }

        let filename = image_filename(topic);
        match self.fetch_to_file(url, &filename).await {
            Ok(path) => {
                info!(path = %path.display(), "Downloaded image");
                DownloadedImage {
                    local_path: path.to_string_lossy().into_owned(),
                    filename: Some(filename),
                }
            }
            Err(e) => {
                error!(url, error = %e, "Image download failed, keeping remote URL");
                DownloadedImage::remote(url)
            }
        }
    }

    async fn fetch_to_file(&self, url: &str, filename: &str) -> Result<PathBuf, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::status(PROVIDER, status.as_u16(), "download failed"));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, &e))?;

        tokio::fs::create_dir_all(&self.storage_path)
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))?;
        let path = self.storage_path.join(filename);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))?;

        Ok(std::fs::canonicalize(&path).unwrap_or(path))
    }
}

/// Builds `{yyyyMMdd_HHmmss}_{topic}_{8 hex}.png`, with the topic reduced to
/// lowercase ASCII alphanumerics and underscores.
#[must_use]
pub fn image_filename(topic: &str) -> String {
    let safe_topic: String = topic
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let suffix = hex::encode(rand::random::<[u8; 4]>());
    format!(
        "{}_{safe_topic}_{suffix}.png",
        Local::now().format("%Y%m%d_%H%M%S")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_image_filename_shape() {
        let name = image_filename("AI & Rust!");
        let parts: Vec<&str> = name.trim_end_matches(".png").split('_').collect();

        assert!(name.ends_with(".png"));
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[1].len(), 6);
        assert!(name.contains("_ai___rust__"));
        assert_eq!(parts.last().unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_disabled_downloader_keeps_remote_url() {
        let downloader =
            ImageDownloader::new(&ImageStorageConfig::default().without_download()).unwrap();
        let image = downloader.download("https://img/1.png", "AI").await;

        assert_eq!(image, DownloadedImage::remote("https://img/1.png"));
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1_u8, 2, 3]))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            ImageDownloader::new(&ImageStorageConfig::default().with_storage_path(dir.path()))
                .unwrap();

        let image = downloader
            .download(&format!("{}/img.png", server.uri()), "AI")
            .await;

        let filename = image.filename.unwrap();
        assert_eq!(std::fs::read(dir.path().join(&filename)).unwrap(), vec![1, 2, 3]);
        assert!(image.local_path.ends_with(&filename));
    }

    #[tokio::test]
    async fn test_failed_download_keeps_remote_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let dir = tempfile::tempdir().unwrap();
        let downloader =
            ImageDownloader::new(&ImageStorageConfig::default().with_storage_path(dir.path()))
                .unwrap();
        let url = format!("{}/missing.png", server.uri());

        let image = downloader.download(&url, "AI").await;

        assert_eq!(image.filename, None);
        assert_eq!(image.local_path, url);
    }
}
