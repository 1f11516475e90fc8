//! Process-wide `tracing` subscriber setup.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by `default_directive`
/// (e.g. `"info"`) when `RUST_LOG` is unset. Later calls are no-ops.
pub fn init_tracing(default_directive: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        tracing_subscriber::fmt()
            .with_target(true)
            .with_env_filter(filter)
            .init();

        tracing::debug!(default = default_directive, "tracing initialised");
    });
}
