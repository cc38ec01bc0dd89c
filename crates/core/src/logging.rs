//! Structured logging infrastructure for TrustRoute.
//!
//! This module provides centralized logging initialization with support
//! for structured JSON output and environment-based configuration.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the logging system with human-readable output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level. Calling this twice is a no-op.
///
/// # Example
/// ```no_run
/// use trustroute_core::logging;
///
/// logging::init();
/// tracing::info!("Simulation started");
/// ```
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Initialize the logging system with JSON output.
///
/// Suitable for piping simulation runs into log analysis tooling.
///
/// # Example
/// ```no_run
/// use trustroute_core::logging;
///
/// logging::init_json();
/// tracing::info!(mode = "proposed", "Run started");
/// ```
pub fn init_json() {
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_target(true))
        .try_init();
}
