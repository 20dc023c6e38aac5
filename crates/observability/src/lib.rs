//! Structured logging for the service.

/// Subscriber installation.
pub mod tracing;

/// Request/exception logger handle.
pub mod logger;

pub use logger::{format_elapsed, ExceptionRecord, Logger};

/// Install the JSON subscriber with the default `info` filter.
///
/// Safe to call multiple times; later calls are no-ops returning `false`.
pub fn init() -> bool {
    tracing::install(tracing::DEFAULT_FILTER)
}
