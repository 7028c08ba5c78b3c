//! `smehub generate`: produce a report locally without touching the store.
//!
//! Runs the same generate-then-fallback path the HTTP handler uses and
//! prints the markdown to stdout. With `--fallback-only` no external
//! service is contacted.

use anyhow::Result;

use smehub_report_core::fallback::build_fallback;
use smehub_report_core::models::BusinessInfo;

use crate::config::Config;
use crate::generator::ReportGenerator;
use crate::handler::{produce_report, ReportSource};

pub async fn run_generate(
    config: &Config,
    info: BusinessInfo,
    prompt: &str,
    fallback_only: bool,
) -> Result<()> {
    let (report, source) = if fallback_only {
        (build_fallback(&info, prompt), ReportSource::Fallback)
    } else {
        let generator = ReportGenerator::from_config(config)?;
        produce_report(&generator, &info, prompt).await
    };

    println!("{}", report);
    eprintln!(
        "source: {}",
        match source {
            ReportSource::Generated => "ai",
            ReportSource::Fallback => "fallback",
        }
    );

    Ok(())
}
