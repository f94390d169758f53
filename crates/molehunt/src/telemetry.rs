//! Log output setup for binaries embedding the engine.

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter` (e.g. `"info"` or `"molehunt_core=debug"`).
///
/// Does nothing if a global subscriber is already set, so tests and
/// embedding applications can call it freely.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
