//! Subscriber setup: JSON lines on stdout, filtered by `RUST_LOG`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Install the process-wide subscriber. `default_filter` applies when
/// `RUST_LOG` is unset or unparsable.
///
/// Returns `false` if a subscriber was already installed; the call is then a
/// no-op.
pub fn install(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_target(false)
        .try_init()
        .is_ok()
}
