//! Logging setup.
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a
//! formatting layer on stderr, so stdout stays reserved for command output
//! (the `generate` command prints markdown there).

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging once at startup.
///
/// `RUST_LOG` overrides the default filter unless `quiet` is set, which
/// always limits output to errors.
pub fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let default_filter = if quiet {
        "error"
    } else if verbose {
        "smehub_report=debug,info"
    } else {
        "info"
    };

    let env_filter = if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(!quiet);

    // A second initialization (tests, library callers) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    Ok(())
}
