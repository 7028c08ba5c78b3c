//! TOML configuration.
//!
//! The whole service is configured from one file (default
//! `./config/smehub.toml`). Every section except `[server]` has defaults,
//! so a minimal file only needs a bind address. API keys are not part of
//! the file; providers read them from the environment once, at construction.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_provider")]
    pub provider: String,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_firestore_url")]
    pub base_url: String,
    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: default_store_provider(),
            project_id: None,
            collection: default_collection(),
            base_url: default_firestore_url(),
            timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_store_provider() -> String {
    "memory".to_string()
}
fn default_collection() -> String {
    "reports".to_string()
}
fn default_firestore_url() -> String {
    "https://firestore.googleapis.com".to_string()
}
fn default_store_timeout_secs() -> u64 {
    15
}

/// `[completion]`: the model that writes the report.
///
/// `model` and `endpoint` default per provider; see
/// [`CompletionConfig::model_name`] and [`CompletionConfig::endpoint_url`].
#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            model: None,
            endpoint: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_completion_timeout_secs(),
        }
    }
}

fn default_disabled() -> String {
    "disabled".to_string()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_temperature() -> f32 {
    0.7
}
fn default_completion_timeout_secs() -> u64 {
    45
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_disabled")]
    pub provider: String,
    #[serde(default = "default_tavily_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_disabled(),
            endpoint: default_tavily_endpoint(),
            max_results: default_max_results(),
            snippet_chars: default_snippet_chars(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

fn default_tavily_endpoint() -> String {
    "https://api.tavily.com".to_string()
}
fn default_max_results() -> usize {
    5
}
fn default_snippet_chars() -> usize {
    smehub_report_core::prompt::DEFAULT_SNIPPET_CHARS
}
fn default_search_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Upper bound on search plus completion for one request.
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_timeout_secs() -> u64 {
    60
}

impl CompletionConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// Configured model, or the provider's default.
    pub fn model_name(&self) -> &str {
        if let Some(model) = &self.model {
            return model;
        }
        match self.provider.as_str() {
            "anthropic" => "claude-3-5-sonnet-20241022",
            "openai" => "gpt-4o-mini",
            _ => "none",
        }
    }

    /// Configured API base URL, or the provider's default.
    pub fn endpoint_url(&self) -> &str {
        if let Some(endpoint) = &self.endpoint {
            return endpoint;
        }
        match self.provider.as_str() {
            "openai" => "https://api.openai.com/v1",
            _ => "https://api.anthropic.com/v1",
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl SearchConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// All-defaults configuration: in-memory store, disabled providers.
    ///
    /// Used by CLI commands that can run without a config file.
    pub fn minimal() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:8000".to_string(),
            },
            store: StoreConfig::default(),
            completion: CompletionConfig::default(),
            search: SearchConfig::default(),
            generation: GenerationConfig::default(),
        }
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        match self.store.provider.as_str() {
            "memory" => {}
            "firestore" => {
                let has_project = self
                    .store
                    .project_id
                    .as_deref()
                    .is_some_and(|p| !p.trim().is_empty());
                if !has_project {
                    anyhow::bail!("store.project_id must be set when provider is 'firestore'");
                }
            }
            other => anyhow::bail!(
                "Unknown store provider: '{}'. Must be memory or firestore.",
                other
            ),
        }
        if self.store.timeout_secs == 0 {
            anyhow::bail!("store.timeout_secs must be > 0");
        }

        match self.completion.provider.as_str() {
            "disabled" | "anthropic" | "openai" => {}
            other => anyhow::bail!(
                "Unknown completion provider: '{}'. Must be disabled, anthropic or openai.",
                other
            ),
        }
        if self.completion.max_tokens == 0 {
            anyhow::bail!("completion.max_tokens must be > 0");
        }
        if self.completion.timeout_secs == 0 {
            anyhow::bail!("completion.timeout_secs must be > 0");
        }
        if !(0.0..=2.0).contains(&self.completion.temperature) {
            anyhow::bail!("completion.temperature must be in [0.0, 2.0]");
        }

        match self.search.provider.as_str() {
            "disabled" | "tavily" => {}
            other => anyhow::bail!(
                "Unknown search provider: '{}'. Must be disabled or tavily.",
                other
            ),
        }
        if self.search.max_results == 0 {
            anyhow::bail!("search.max_results must be >= 1");
        }
        if self.search.snippet_chars == 0 {
            anyhow::bail!("search.snippet_chars must be > 0");
        }
        if self.search.timeout_secs == 0 {
            anyhow::bail!("search.timeout_secs must be > 0");
        }

        if self.generation.timeout_secs == 0 {
            anyhow::bail!("generation.timeout_secs must be > 0");
        }

        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config = parse("[server]\nbind = \"127.0.0.1:0\"\n").unwrap();
        assert_eq!(config.store.provider, "memory");
        assert_eq!(config.store.collection, "reports");
        assert!(!config.completion.is_enabled());
        assert!(!config.search.is_enabled());
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.completion.max_tokens, 4000);
        assert_eq!(config.completion.timeout(), Duration::from_secs(45));
        assert_eq!(config.generation.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_full_file() {
        let config = parse(
            r#"
[server]
bind = "0.0.0.0:8000"

[store]
provider = "firestore"
project_id = "smehub"
base_url = "http://localhost:8080"

[completion]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
max_tokens = 1500

[search]
provider = "tavily"
max_results = 3

[generation]
timeout_secs = 90
"#,
        )
        .unwrap();
        assert_eq!(config.store.project_id.as_deref(), Some("smehub"));
        assert_eq!(config.store.base_url, "http://localhost:8080");
        assert_eq!(config.completion.model_name(), "claude-3-5-haiku-20241022");
        assert_eq!(config.completion.endpoint_url(), "https://api.anthropic.com/v1");
        assert_eq!(config.search.max_results, 3);
        assert_eq!(config.generation.timeout_secs, 90);
    }

    #[test]
    fn test_completion_defaults_follow_provider() {
        let anthropic = parse(
            r#"
[server]
bind = "x"

[completion]
provider = "anthropic"
"#,
        )
        .unwrap();
        assert_eq!(anthropic.completion.model_name(), "claude-3-5-sonnet-20241022");
        assert_eq!(anthropic.completion.endpoint_url(), "https://api.anthropic.com/v1");

        let openai = parse(
            r#"
[server]
bind = "x"

[completion]
provider = "openai"
endpoint = "http://llm.local/v1"
"#,
        )
        .unwrap();
        assert_eq!(openai.completion.model_name(), "gpt-4o-mini");
        assert_eq!(openai.completion.endpoint_url(), "http://llm.local/v1");
    }

    #[test]
    fn test_firestore_requires_project() {
        let err = parse("[server]\nbind = \"x\"\n[store]\nprovider = \"firestore\"\n").unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }

    #[test]
    fn test_rejects_unknown_providers_and_zero_limits() {
        assert!(parse("[server]\nbind = \"x\"\n[completion]\nprovider = \"llama\"\n").is_err());
        assert!(parse("[server]\nbind = \"x\"\n[search]\nprovider = \"bing\"\n").is_err());
        assert!(parse("[server]\nbind = \"x\"\n[search]\nmax_results = 0\n").is_err());
        assert!(parse("[server]\nbind = \"x\"\n[generation]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn test_minimal_config_is_valid() {
        Config::minimal().validate().unwrap();
    }
}
