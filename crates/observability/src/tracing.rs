//! Tracing/logging initialization.
//!
//! Filtering comes from `RUST_LOG` and falls back to [`DEFAULT_FILTER`].
//! Both initializers are safe to call more than once; later calls are no-ops.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// JSON lines with timestamps, for the long-running server.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Compact human-readable output on stderr, for one-shot commands.
pub fn init_for_cli() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
