//! Logging setup for hostbench
//!
//! One `tracing` subscriber writing to stderr, so JSON on stdout stays clean.
//! `RUST_LOG` wins over the level derived from `-q` / `-v`.

use crate::cli::Verbosity;
use crate::errors::{BenchError, Result};
use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity level
pub fn default_directive(verbosity: Verbosity) -> &'static str {
    match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "warn",
        Verbosity::Verbose => "info",
        Verbosity::VeryVerbose => "debug",
    }
}

/// Build the filter, preferring `RUST_LOG` when it parses
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(verbosity: Verbosity) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| BenchError::Generic(format!("Failed to initialise logging: {}", e)))
}
