//! Tracing setup.

use tracing_subscriber::EnvFilter;

/// Initializes the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, defaulting to `info`.
/// Call once, before anything logs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
