//! # SmeHub report CLI (`smehub`)
//!
//! The `smehub` binary runs the report HTTP service and offers local
//! helpers for generating reports and checking connectivity.
//!
//! ## Usage
//!
//! ```bash
//! smehub --config ./config/smehub.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `smehub serve` | Start the HTTP server |
//! | `smehub generate` | Generate a report locally and print the markdown |
//! | `smehub check` | Show configured providers and ping the document store |
//!
//! ## Examples
//!
//! ```bash
//! # Start the API on [server].bind
//! smehub serve --config ./config/smehub.toml
//!
//! # Template report without any external calls
//! smehub generate --business-name Acme --country US --industry Tech \
//!     --prompt "Summarize market" --fallback-only
//! ```
//!
//! API keys (`CLAUDE_API_KEY` or `OPENAI_API_KEY`, `TAVILY_API_KEY`,
//! `FIRESTORE_ACCESS_TOKEN`) are read from the environment; a `.env` file in the working directory is
//! loaded first.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use smehub_report::config::{self, Config};
use smehub_report_core::models::BusinessInfo;
use smehub_report::{check, generate_cmd, observability, server};

/// SmeHub report service: AI-generated business reports backed by Firestore.
#[derive(Parser)]
#[command(
    name = "smehub",
    about = "SmeHub report service: AI-generated business reports backed by Firestore",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/smehub.toml")]
    config: PathBuf,

    /// Enable debug logging for this crate.
    #[arg(long, global = true)]
    verbose: bool,

    /// Only log errors.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Serves `POST /api/request-report`, `GET /` and `GET /health` on
    /// the address configured in `[server].bind`.
    Serve,

    /// Generate a report locally and print it as markdown.
    ///
    /// Uses the configured search and completion providers and falls back
    /// to the template report when generation fails. The document store is
    /// not touched. Runs with built-in defaults when the config file is
    /// missing.
    Generate {
        #[arg(long, default_value = "")]
        business_name: String,

        #[arg(long, default_value = "")]
        postal_code: String,

        #[arg(long, default_value = "")]
        country: String,

        #[arg(long, default_value = "")]
        industry: String,

        /// What the report should focus on.
        #[arg(long)]
        prompt: String,

        /// Skip search and completion; print the template report.
        #[arg(long)]
        fallback_only: bool,
    },

    /// Show configured providers and ping the document store.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    observability::init_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Generate {
            business_name,
            postal_code,
            country,
            industry,
            prompt,
            fallback_only,
        } => {
            let cfg = if cli.config.exists() {
                config::load_config(&cli.config)?
            } else {
                Config::minimal()
            };
            let info = BusinessInfo {
                business_name,
                postal_code,
                country,
                industry,
            };
            generate_cmd::run_generate(&cfg, info, &prompt, fallback_only).await?;
        }
        Commands::Serve => {
            let cfg = config::load_config(&cli.config)?;
            server::run_server(&cfg).await?;
        }
        Commands::Check => {
            let cfg = config::load_config(&cli.config)?;
            check::run_check(&cfg).await?;
        }
    }

    Ok(())
}
