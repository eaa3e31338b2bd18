//! SerpAPI web search.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

use super::WebSearch;
use crate::config::SearchConfig;
use crate::errors::ProviderError;

const PROVIDER: &str = "serpapi";

/// One organic search hit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// Page title.
    pub title: String,
    /// Result snippet.
    pub snippet: String,
    /// Page URL.
    pub link: String,
    /// Display form of the URL.
    pub display_link: String,
    /// Publication date, if reported.
    pub date: String,
    /// One-based rank.
    pub position: usize,
}

impl SearchResult {
    /// Creates a result from the three fields that matter for research.
    #[must_use]
    pub fn new(title: impl Into<String>, snippet: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            link: link.into(),
            ..Self::default()
        }
    }

    /// Formats the hit as `title: snippet [link]`, skipping empty parts.
    #[must_use]
    pub fn to_formatted_text(&self) -> String {
        let mut text = self.title.clone();
        if !self.snippet.is_empty() {
            if !text.is_empty() {
                text.push_str(": ");
            }
            text.push_str(&self.snippet);
        }
        if !self.link.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push('[');
            text.push_str(&self.link);
            text.push(']');
        }
        text
    }
}

/// The parsed response for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchResponse {
    /// The query that was run.
    pub query: String,
    /// Organic results in rank order.
    pub results: Vec<SearchResult>,
    /// Knowledge graph highlights (`title`, `description`, `sourceLink`).
    pub knowledge_graph: BTreeMap<String, String>,
    /// Total results reported by the engine.
    pub total_results: u64,
    /// Search time in seconds.
    pub search_time: f64,
}

impl WebSearchResponse {
    /// Creates a response with no results.
    #[must_use]
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// Renders up to five results as a numbered list for prompting.
    #[must_use]
    pub fn to_summary_text(&self) -> String {
        if self.results.is_empty() {
            return format!("No search results found for: {}", self.query);
        }

        let mut summary = format!("Search results for '{}':\n\n", self.query);
        for (index, result) in self.results.iter().take(5).enumerate() {
            summary.push_str(&format!("{}. {}\n\n", index + 1, result.to_formatted_text()));
        }
        summary
    }

    /// Returns up to five distinct non-empty result links.
    #[must_use]
    pub fn extract_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for result in &self.results {
            if sources.len() == 5 {
                break;
            }
            if !result.link.is_empty() && !sources.contains(&result.link) {
                sources.push(result.link.clone());
            }
        }
        sources
    }
}

/// Search backend used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledSearch;

#[async_trait]
impl WebSearch for DisabledSearch {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn search(&self, query: &str) -> WebSearchResponse {
        WebSearchResponse::empty(query)
    }
}

/// SerpAPI client.
#[derive(Debug, Clone)]
pub struct SerpApiSearch {
    client: reqwest::Client,
    config: SearchConfig,
}

impl SerpApiSearch {
    /// Creates a client from configuration.
    pub fn new(config: SearchConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }

    async fn fetch(&self, query: &str) -> Result<Value, ProviderError> {
        let max_results = self.config.max_results.to_string();
        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("engine", self.config.engine.as_str()),
                ("q", query),
                ("location", self.config.location.as_str()),
                ("hl", "en"),
                ("gl", "us"),
                ("num", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::transport(PROVIDER, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::status(PROVIDER, status.as_u16(), body));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::invalid_response(PROVIDER, e.to_string()))
    }

    fn parse(&self, query: &str, body: &Value) -> WebSearchResponse {
        let text = |value: &Value, key: &str| -> String {
            match value.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::Bool(b)) => b.to_string(),
                _ => String::new(),
            }
        };

        let results: Vec<SearchResult> = body
            .get("organic_results")
            .and_then(Value::as_array)
            .map(|organic| {
                organic
                    .iter()
                    .take(self.config.max_results)
                    .enumerate()
                    .map(|(index, hit)| SearchResult {
                        title: text(hit, "title"),
                        snippet: text(hit, "snippet"),
                        link: text(hit, "link"),
                        display_link: text(hit, "displayed_link"),
                        date: text(hit, "date"),
                        position: index + 1,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut knowledge_graph = BTreeMap::new();
        if let Some(graph) = body.get("knowledge_graph") {
            for key in ["title", "description"] {
                let value = text(graph, key);
                if !value.is_empty() {
                    knowledge_graph.insert(key.to_string(), value);
                }
            }
            if let Some(source) = graph.get("source") {
                let link = text(source, "link");
                if !link.is_empty() {
                    knowledge_graph.insert("sourceLink".to_string(), link);
                }
            }
        }

        let info = body.get("search_information");
        let total_results = info
            .and_then(|info| info.get("total_results"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let search_time = info
            .map(|info| text(info, "time_taken_displayed"))
            .map(|raw| {
                raw.chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.')
                    .collect::<String>()
            })
            .and_then(|digits| digits.parse::<f64>().ok())
            .unwrap_or(0.0);

        debug!(query, results = results.len(), "Parsed search results");
        WebSearchResponse {
            query: query.to_string(),
            results,
            knowledge_graph,
            total_results,
            search_time,
        }
    }
}

#[async_trait]
impl WebSearch for SerpApiSearch {
    fn is_enabled(&self) -> bool {
        self.config.is_active()
    }

    async fn search(&self, query: &str) -> WebSearchResponse {
        if !self.is_enabled() {
            warn!("Web search is not configured or disabled, returning empty results");
            return WebSearchResponse::empty(query);
        }

        debug!(query, "Searching web");
        match self.fetch(query).await {
            Ok(body) => self.parse(query, &body),
            Err(e) => {
                error!(query, error = %e, "Web search failed");
                WebSearchResponse::empty(query)
            }
        }
    }
}
