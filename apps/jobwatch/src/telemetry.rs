//! Console tracing setup.
//!
//! Respects `RUST_LOG`; defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber for the binary.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .init();
}
