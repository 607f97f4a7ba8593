//! Tracing setup for scenario runs

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a `tracing` subscriber honouring `RUST_LOG`, writing to stderr
///
/// For binaries. Returns `false` if a subscriber was already set.
pub fn init_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

/// Install a `tracing` subscriber whose output is captured per test
///
/// Safe to call from every test; returns `false` if a subscriber was already
/// set.
pub fn init_test_logging() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init()
        .is_ok()
}
