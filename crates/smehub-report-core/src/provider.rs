//! Collaborator traits for web search and text completion.
//!
//! Concrete provider implementations (OpenAI, Tavily, disabled) live in
//! the `smehub-report` app crate. The generator only sees these traits,
//! so tests substitute stubs without any network access.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One piece of web context returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSnippet {
    pub text: String,
    /// Where the text came from, usually a URL.
    pub source: Option<String>,
}

impl SearchSnippet {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Web search backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider label (e.g. `"tavily"`).
    fn name(&self) -> &str;

    /// Return at most `max_results` snippets for `query`, best first.
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchSnippet>>;
}

/// Text-generation backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Generate text for `prompt` within `max_tokens`, giving up after `timeout`.
    async fn complete(&self, prompt: &str, max_tokens: u32, timeout: Duration) -> Result<String>;
}
