//! Web search provider implementations.
//!
//! - **[`DisabledSearch`]**: always fails; the generator proceeds without context.
//! - **[`TavilyProvider`]**: calls the Tavily `search` API.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use smehub_report_core::provider::{SearchProvider, SearchSnippet};

use crate::config::SearchConfig;

/// A search provider that always returns an error.
///
/// Used when `search.provider = "disabled"`.
pub struct DisabledSearch;

#[async_trait]
impl SearchProvider for DisabledSearch {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchSnippet>> {
        bail!("Search provider is disabled")
    }
}

/// Search provider backed by the Tavily API.
pub struct TavilyProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl TavilyProvider {
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("Tavily API key must not be empty");
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            timeout: config.timeout(),
        })
    }

    /// Create a provider using `TAVILY_API_KEY` from the environment.
    pub fn from_env(config: &SearchConfig) -> Result<Self> {
        let api_key = std::env::var("TAVILY_API_KEY")
            .map_err(|_| anyhow::anyhow!("TAVILY_API_KEY environment variable not set"))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl SearchProvider for TavilyProvider {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchSnippet>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        debug!(query, max_results, "sending search request");

        let response = self
            .client
            .post(format!("{}/search", self.endpoint))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&serde_json::json!({
                "query": query,
                "max_results": max_results,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Tavily API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        let mut snippets = parse_search_response(&json)?;
        snippets.truncate(max_results);
        Ok(snippets)
    }
}

/// Extract `results[].content` (and `url`) in response order, skipping
/// entries without text.
fn parse_search_response(json: &serde_json::Value) -> Result<Vec<SearchSnippet>> {
    let results = json
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Tavily response: missing results array"))?;

    Ok(results
        .iter()
        .filter_map(|item| {
            let text = item.get("content").and_then(|c| c.as_str())?.trim();
            if text.is_empty() {
                return None;
            }
            let snippet = SearchSnippet::new(text);
            Some(match item.get("url").and_then(|u| u.as_str()) {
                Some(url) => snippet.with_source(url),
                None => snippet,
            })
        })
        .collect())
}

/// Create the [`SearchProvider`] named in the configuration.
pub fn create_search_provider(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledSearch)),
        "tavily" => Ok(Arc::new(TavilyProvider::from_env(config)?)),
        other => bail!("Unknown search provider: {}", other),
    }
}
