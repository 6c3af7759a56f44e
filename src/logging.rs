//! Tracing subscriber setup shared by the server and the admin CLI.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::application::services::sweeper::LOG_TARGET as SWEEPER_TARGET;

/// Parses `level` as an `EnvFilter` directive list, falling back to `info`.
pub fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Extends `level` so every per-record sweep decision is logged.
pub fn with_sweep_decisions(level: &str) -> String {
    format!("{level},{SWEEPER_TARGET}=trace")
}

/// Installs the global subscriber in `text` or `json` format.
///
/// Does nothing if a subscriber is already installed.
pub fn init_tracing(level: &str, format: &str) {
    let registry = tracing_subscriber::registry().with(filter_for(level));

    let result = if format == "json" {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {e}");
    }
}
