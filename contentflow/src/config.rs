//! Application configuration.
//!
//! Every section deserializes with defaults, so a partial JSON file is
//! enough. [`CliArgs`] layers command-line flags and environment variables on
//! top of an optional file.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::ConfigError;
use crate::observability::LogFormat;

/// OpenAI chat and image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,
    /// API root, without trailing slash.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Chat completion model.
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Image generation model.
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Chat request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Image request timeout in milliseconds.
    #[serde(default = "default_image_timeout_ms")]
    pub image_timeout_ms: u64,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token limit.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_text_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

const fn default_timeout_ms() -> u64 {
    60_000
}

const fn default_image_timeout_ms() -> u64 {
    120_000
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_max_tokens() -> u32 {
    2000
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            timeout_ms: default_timeout_ms(),
            image_timeout_ms: default_image_timeout_ms(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl OpenAiConfig {
    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Chat request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Image request timeout.
    #[must_use]
    pub fn image_timeout(&self) -> Duration {
        Duration::from_millis(self.image_timeout_ms)
    }
}

/// SerpAPI web search settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API key; search is inactive without one.
    #[serde(default)]
    pub api_key: String,
    /// API root, without trailing slash.
    #[serde(default = "default_search_base_url")]
    pub base_url: String,
    /// Search engine name.
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Search location.
    #[serde(default = "default_location")]
    pub location: String,
    /// Maximum organic results kept per query.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Master switch.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a cached response stays valid.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Maximum number of cached queries.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

fn default_search_base_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_engine() -> String {
    "google".to_string()
}

fn default_location() -> String {
    "United States".to_string()
}

const fn default_max_results() -> usize {
    5
}

const fn default_true() -> bool {
    true
}

const fn default_search_timeout_secs() -> u64 {
    30
}

const fn default_cache_ttl_secs() -> u64 {
    3600
}

const fn default_cache_max_entries() -> usize {
    100
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_search_base_url(),
            engine: default_engine(),
            location: default_location(),
            max_results: default_max_results(),
            enabled: default_true(),
            timeout_secs: default_search_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

impl SearchConfig {
    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Sets the API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Returns true if searches should hit the API.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && !self.api_key.is_empty()
    }

    /// Request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cache entry lifetime.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Local storage of generated images.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageStorageConfig {
    /// Whether generated images are copied to local storage.
    #[serde(default = "default_true")]
    pub download_enabled: bool,
    /// Directory for downloaded images.
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    /// Public root used to build `/generated-image/{file}` URLs.
    #[serde(default = "default_public_base_url")]
    pub base_url: String,
    /// Whether remote URLs are kept in results.
    #[serde(default = "default_true")]
    pub keep_remote_url: bool,
    /// Download timeout in seconds.
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./generated-images")
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

const fn default_download_timeout_secs() -> u64 {
    60
}

impl Default for ImageStorageConfig {
    fn default() -> Self {
        Self {
            download_enabled: default_true(),
            storage_path: default_storage_path(),
            base_url: default_public_base_url(),
            keep_remote_url: default_true(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

impl ImageStorageConfig {
    /// Disables local downloads.
    #[must_use]
    pub fn without_download(mut self) -> Self {
        self.download_enabled = false;
        self
    }

    /// Sets the storage directory.
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Download timeout.
    #[must_use]
    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Long-lived workers.
    #[serde(default = "default_core_workers")]
    pub core_workers: usize,
    /// Upper bound on workers, including overflow workers.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Jobs waiting for a worker before overflow starts.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Idle time before an overflow worker exits, in seconds.
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    /// Time allowed for queued jobs to drain on shutdown, in seconds.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
    /// Prefix for worker names in logs.
    #[serde(default = "default_worker_name_prefix")]
    pub worker_name_prefix: String,
}

const fn default_core_workers() -> usize {
    5
}

const fn default_max_workers() -> usize {
    20
}

const fn default_queue_capacity() -> usize {
    100
}

const fn default_keep_alive_secs() -> u64 {
    60
}

const fn default_shutdown_grace_secs() -> u64 {
    30
}

fn default_worker_name_prefix() -> String {
    "AsyncGeneration-".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            core_workers: default_core_workers(),
            max_workers: default_max_workers(),
            queue_capacity: default_queue_capacity(),
            keep_alive_secs: default_keep_alive_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            worker_name_prefix: default_worker_name_prefix(),
        }
    }
}

impl DispatchConfig {
    /// Sets core workers, max workers and queue capacity together.
    #[must_use]
    pub fn with_sizes(mut self, core_workers: usize, max_workers: usize, queue_capacity: usize) -> Self {
        self.core_workers = core_workers;
        self.max_workers = max_workers;
        self.queue_capacity = queue_capacity;
        self
    }

    /// Overflow worker idle timeout.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// Shutdown drain period.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Checks the sizes are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_workers == 0 {
            return Err(ConfigError::new("dispatch.core_workers", "must be at least 1"));
        }
        if self.max_workers < self.core_workers {
            return Err(ConfigError::new(
                "dispatch.max_workers",
                "must not be smaller than core_workers",
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::new("dispatch.queue_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

/// Periodic task eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Seconds between passes.
    #[serde(default = "default_cleanup_interval_secs")]
    pub interval_secs: u64,
    /// Tasks older than this many seconds are evicted.
    #[serde(default = "default_max_task_age_secs")]
    pub max_task_age_secs: u64,
}

const fn default_cleanup_interval_secs() -> u64 {
    300
}

const fn default_max_task_age_secs() -> u64 {
    3600
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_cleanup_interval_secs(),
            max_task_age_secs: default_max_task_age_secs(),
        }
    }
}

impl CleanupConfig {
    /// Time between passes.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Maximum task age.
    #[must_use]
    pub fn max_task_age(&self) -> Duration {
        Duration::from_secs(self.max_task_age_secs)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
    /// Users registered with the content store at startup.
    #[serde(default)]
    pub users: Vec<String>,
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            users: Vec::new(),
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// OpenAI settings.
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,
    /// Image storage settings.
    #[serde(default)]
    pub images: ImageStorageConfig,
    /// Worker pool settings.
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Cleanup settings.
    #[serde(default)]
    pub cleanup: CleanupConfig,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Log line format.
    #[serde(default)]
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Reads a JSON configuration file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new("config", format!("{}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| ConfigError::new("config", format!("{}: {e}", path.display())))
    }

    /// Checks that the configuration can start the service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.openai.api_key.trim().is_empty() {
            return Err(ConfigError::missing("openai.api_key"));
        }
        if self.cleanup.interval_secs == 0 {
            return Err(ConfigError::new("cleanup.interval_secs", "must be at least 1"));
        }
        self.dispatch.validate()
    }
}

/// Command-line flags. Each flag can also come from the environment.
#[derive(Debug, Clone, Default, Parser)]
#[command(author, version, about = "Contentflow - research, content and image generation service")]
pub struct CliArgs {
    /// JSON configuration file used as the base layer
    #[arg(long, env = "CONTENTFLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "CONTENTFLOW_BIND")]
    pub bind: Option<SocketAddr>,

    /// Log format: pretty or json
    #[arg(long, env = "CONTENTFLOW_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// OpenAI API root
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    /// Chat completion model
    #[arg(long, env = "OPENAI_MODEL")]
    pub openai_model: Option<String>,

    /// Image generation model
    #[arg(long, env = "OPENAI_IMAGE_MODEL")]
    pub openai_image_model: Option<String>,

    /// SerpAPI key
    #[arg(long, env = "SERPAPI_API_KEY", hide_env_values = true)]
    pub serpapi_api_key: Option<String>,

    /// Enable or disable web search
    #[arg(long, env = "SERPAPI_ENABLED")]
    pub search_enabled: Option<bool>,

    /// Enable or disable local image downloads
    #[arg(long, env = "IMAGES_DOWNLOAD_ENABLED")]
    pub images_download_enabled: Option<bool>,

    /// Directory for downloaded images
    #[arg(long, env = "IMAGES_STORAGE_PATH")]
    pub images_storage_path: Option<PathBuf>,

    /// Public root for image URLs
    #[arg(long, env = "IMAGES_BASE_URL")]
    pub images_base_url: Option<String>,

    /// Long-lived workers
    #[arg(long, env = "CONTENTFLOW_CORE_WORKERS")]
    pub core_workers: Option<usize>,

    /// Maximum workers
    #[arg(long, env = "CONTENTFLOW_MAX_WORKERS")]
    pub max_workers: Option<usize>,

    /// Queue capacity
    #[arg(long, env = "CONTENTFLOW_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// User email allowed to persist content; repeat or comma-separate
    #[arg(long = "user", env = "CONTENTFLOW_USERS", value_delimiter = ',')]
    pub users: Vec<String>,
}

impl CliArgs {
    /// Builds the configuration: file (or defaults), then flags.
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_json_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.server.bind_address = bind;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
        if let Some(key) = self.openai_api_key {
            config.openai.api_key = key;
        }
        if let Some(url) = self.openai_base_url {
            config.openai.base_url = url;
        }
        if let Some(model) = self.openai_model {
            config.openai.text_model = model;
        }
        if let Some(model) = self.openai_image_model {
            config.openai.image_model = model;
        }
        if let Some(key) = self.serpapi_api_key {
            config.search.api_key = key;
        }
        if let Some(enabled) = self.search_enabled {
            config.search.enabled = enabled;
        }
        if let Some(enabled) = self.images_download_enabled {
            config.images.download_enabled = enabled;
        }
        if let Some(path) = self.images_storage_path {
            config.images.storage_path = path;
        }
        if let Some(url) = self.images_base_url {
            config.images.base_url = url;
        }
        if let Some(core) = self.core_workers {
            config.dispatch.core_workers = core;
        }
        if let Some(max) = self.max_workers {
            config.dispatch.max_workers = max;
        }
        if let Some(capacity) = self.queue_capacity {
            config.dispatch.queue_capacity = capacity;
        }
        config.server.users.extend(self.users);

        config.validate()?;
        Ok(config)
    }
}
