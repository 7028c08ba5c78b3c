//! `smehub check`: configuration and connectivity summary.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::store::create_store;

/// Print the configured providers and ping the document store.
///
/// Fails when the store cannot be built or does not answer, so the command
/// doubles as a deployment smoke test.
pub async fn run_check(config: &Config) -> Result<()> {
    println!("{:<12} {:<12} DETAIL", "COMPONENT", "PROVIDER");
    println!(
        "{:<12} {:<12} collection={}",
        "store", config.store.provider, config.store.collection
    );
    if config.completion.is_enabled() {
        println!(
            "{:<12} {:<12} model={} max_tokens={}",
            "completion",
            config.completion.provider,
            config.completion.model_name(),
            config.completion.max_tokens
        );
    } else {
        println!("{:<12} {:<12} reports use the fallback template", "completion", "disabled");
    }
    if config.search.is_enabled() {
        println!(
            "{:<12} {:<12} max_results={}",
            "search", config.search.provider, config.search.max_results
        );
    } else {
        println!("{:<12} {:<12} no web context", "search", "disabled");
    }

    let store = create_store(&config.store)?;
    match store.ping().await {
        Ok(()) => println!("store connected: true"),
        Err(e) => {
            println!("store connected: false");
            bail!("document store '{}' is unreachable: {:#}", store.name(), e);
        }
    }

    Ok(())
}
