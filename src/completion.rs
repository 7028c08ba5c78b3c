//! Completion provider implementations.
//!
//! - **[`DisabledCompletion`]**: always fails; every report takes the fallback path.
//! - **[`AnthropicProvider`]**: calls the Anthropic `messages` API (Claude).
//! - **[`OpenAIProvider`]**: calls an OpenAI-compatible `chat/completions` endpoint.
//!
//! Use [`create_completion_provider`] to build the provider named in
//! `[completion].provider`.
//!
//! There is no retry loop: a failed completion is absorbed by the fallback
//! report instead.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use smehub_report_core::prompt::SYSTEM_PROMPT;
use smehub_report_core::provider::CompletionProvider;

use crate::config::CompletionConfig;

/// Value sent in the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============ Disabled Provider ============

/// A completion provider that always returns an error.
///
/// Used when `completion.provider = "disabled"`.
pub struct DisabledCompletion;

#[async_trait]
impl CompletionProvider for DisabledCompletion {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _timeout: Duration,
    ) -> Result<String> {
        bail!("Completion provider is disabled")
    }
}

// ============ Anthropic Provider ============

/// Completion provider for the Anthropic messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
}

impl AnthropicProvider {
    /// Create a provider with an explicit API key.
    pub fn new(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("Anthropic API key must not be empty");
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_key,
            model: config.model_name().to_string(),
            endpoint: config.endpoint_url().trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    /// Create a provider using `CLAUDE_API_KEY` from the environment.
    pub fn from_env(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("CLAUDE_API_KEY")
            .map_err(|_| anyhow!("CLAUDE_API_KEY environment variable not set"))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32, timeout: Duration) -> Result<String> {
        let body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": self.temperature,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": prompt },
            ],
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "sending messages request");

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Anthropic API error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_messages_response(&json)
    }
}

/// Extract the first text block of a messages response.
fn parse_messages_response(json: &Value) -> Result<String> {
    json.get("content")
        .and_then(|c| c.as_array())
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|b| b.get("type").and_then(|t| t.as_str()).unwrap_or("text") == "text")
        })
        .and_then(|b| b.get("text"))
        .and_then(|t| t.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid Anthropic response: missing content[0].text"))
}

// ============ OpenAI Provider ============

/// Completion provider for the OpenAI chat-completions API.
///
/// Any server speaking the same protocol works by pointing
/// `completion.endpoint` at it.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    temperature: f32,
}

impl OpenAIProvider {
    /// Create a provider with an explicit API key.
    pub fn new(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            bail!("OpenAI API key must not be empty");
        }

        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_key,
            model: config.model_name().to_string(),
            endpoint: config.endpoint_url().trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }

    /// Create a provider using `OPENAI_API_KEY` from the environment.
    pub fn from_env(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow!("OPENAI_API_KEY environment variable not set"))?;
        Self::new(config, api_key)
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, max_tokens: u32, timeout: Duration) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": max_tokens,
            "temperature": self.temperature,
        });

        debug!(model = %self.model, prompt_len = prompt.len(), "sending completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("OpenAI API error {}: {}", status, body_text);
        }

        let json: Value = response.json().await?;
        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &Value) -> Result<String> {
    let content = json
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: missing choices[0].message.content"))?;

    Ok(content.to_string())
}

/// Create the [`CompletionProvider`] named in the configuration.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledCompletion`] |
/// | `"anthropic"` | [`AnthropicProvider`] |
/// | `"openai"` | [`OpenAIProvider`] |
pub fn create_completion_provider(
    config: &CompletionConfig,
) -> Result<Arc<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledCompletion)),
        "anthropic" => Ok(Arc::new(AnthropicProvider::from_env(config)?)),
        "openai" => Ok(Arc::new(OpenAIProvider::from_env(config)?)),
        other => bail!("Unknown completion provider: {}", other),
    }
}
