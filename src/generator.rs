//! Search-augmented AI report generation.
//!
//! [`ReportGenerator::generate`] runs web search (best effort) and then a
//! completion call, all under one overall deadline. It never returns an
//! `Err`: the outcome is either [`GenerationOutcome::Generated`] or
//! [`GenerationOutcome::Failed`] with the reason, and the handler decides
//! what to do with a failure.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

use smehub_report_core::models::BusinessInfo;
use smehub_report_core::prompt::{compose_prompt, compose_search_query};
use smehub_report_core::provider::{CompletionProvider, SearchProvider, SearchSnippet};

use crate::completion::create_completion_provider;
use crate::config::Config;
use crate::web_search::create_search_provider;

/// Why AI generation did not produce a report.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion failed: {0}")]
    Completion(String),
    #[error("completion returned empty text")]
    EmptyCompletion,
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result of one generation attempt.
#[derive(Debug)]
pub enum GenerationOutcome {
    Generated(String),
    Failed(GenerationError),
}

/// Tunables for [`ReportGenerator`], taken from `[search]`, `[completion]`
/// and `[generation]`.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub max_results: usize,
    pub snippet_chars: usize,
    pub search_timeout: Duration,
    pub max_tokens: u32,
    pub completion_timeout: Duration,
    pub overall_timeout: Duration,
}

impl GeneratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_results: config.search.max_results,
            snippet_chars: config.search.snippet_chars,
            search_timeout: config.search.timeout(),
            max_tokens: config.completion.max_tokens,
            completion_timeout: config.completion.timeout(),
            overall_timeout: config.generation.timeout(),
        }
    }
}

pub struct ReportGenerator {
    search: Arc<dyn SearchProvider>,
    completion: Arc<dyn CompletionProvider>,
    settings: GeneratorSettings,
}

impl ReportGenerator {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        completion: Arc<dyn CompletionProvider>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            search,
            completion,
            settings,
        }
    }

    /// Build a generator with the providers named in the configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            create_search_provider(&config.search)?,
            create_completion_provider(&config.completion)?,
            GeneratorSettings::from_config(config),
        ))
    }

    /// Generate a markdown report, bounded by the overall timeout.
    pub async fn generate(&self, info: &BusinessInfo, final_prompt: &str) -> GenerationOutcome {
        let deadline = self.settings.overall_timeout;
        match tokio::time::timeout(deadline, self.generate_inner(info, final_prompt)).await {
            Ok(outcome) => outcome,
            Err(_) => GenerationOutcome::Failed(GenerationError::Timeout(deadline)),
        }
    }

    async fn generate_inner(&self, info: &BusinessInfo, final_prompt: &str) -> GenerationOutcome {
        let snippets = self.gather_context(info).await;
        let prompt = compose_prompt(info, final_prompt, &snippets, self.settings.snippet_chars);

        let completion = self.completion.complete(
            &prompt,
            self.settings.max_tokens,
            self.settings.completion_timeout,
        );
        let text = match tokio::time::timeout(self.settings.completion_timeout, completion).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                let reason = format!("{:#}", e);
                return GenerationOutcome::Failed(GenerationError::Completion(reason));
            }
            Err(_) => {
                return GenerationOutcome::Failed(GenerationError::Timeout(
                    self.settings.completion_timeout,
                ))
            }
        };

        if text.trim().is_empty() {
            return GenerationOutcome::Failed(GenerationError::EmptyCompletion);
        }

        info!(
            model = self.completion.model_name(),
            context_snippets = snippets.len(),
            report_len = text.len(),
            "AI report generated"
        );
        GenerationOutcome::Generated(text)
    }

    /// Fetch web context. Failures are logged and yield no snippets.
    async fn gather_context(&self, info: &BusinessInfo) -> Vec<SearchSnippet> {
        let query = compose_search_query(info);
        if query.is_empty() {
            debug!("no business details for a search query; skipping search");
            return Vec::new();
        }

        let search = self.search.search(&query, self.settings.max_results);
        match tokio::time::timeout(self.settings.search_timeout, search).await {
            Ok(Ok(mut snippets)) => {
                snippets.truncate(self.settings.max_results);
                debug!(
                    provider = self.search.name(),
                    count = snippets.len(),
                    "search context retrieved"
                );
                snippets
            }
            Ok(Err(e)) => {
                let error = format!("{:#}", e);
                warn!(
                    provider = self.search.name(),
                    error = %error,
                    "search failed; continuing without context"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    provider = self.search.name(),
                    "search timed out; continuing without context"
                );
                Vec::new()
            }
        }
    }
}
