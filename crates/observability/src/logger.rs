//! Request and exception logging behind an explicit handle.
//!
//! The handle is created once at process start ([`Logger::initialise`]),
//! cloned into the router state, and closed at process stop
//! ([`Logger::shutdown`]). Nothing here reads global mutable state besides the
//! tracing subscriber itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// What gets logged for a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRecord {
    pub code: u16,
    pub message: String,
    /// Underlying cause; logged, never sent to clients.
    pub cause: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Logger {
    service: &'static str,
    closed: Arc<AtomicBool>,
}

impl Logger {
    /// Install the subscriber (idempotent) and hand out a logger.
    pub fn initialise(service: &'static str) -> Self {
        let installed = crate::init();
        let logger = Self::detached(service);
        tracing::info!(service, installed, "logger initialised");
        logger
    }

    /// A logger that relies on whatever subscriber is already installed (tests).
    pub fn detached(service: &'static str) -> Self {
        Self {
            service,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn log_request_start(&self, method: &str, path: &str, timestamp: &str, host: &str) {
        tracing::info!(
            service = self.service,
            method,
            path,
            timestamp,
            host,
            "request started"
        );
    }

    pub fn log_request_end(
        &self,
        method: &str,
        path: &str,
        timestamp: &str,
        elapsed: Duration,
        host: &str,
    ) {
        tracing::info!(
            service = self.service,
            method,
            path,
            timestamp,
            process_time = %format_elapsed(elapsed),
            host,
            "request finished"
        );
    }

    pub fn log_exception(&self, record: &ExceptionRecord) {
        if record.code >= 500 {
            tracing::error!(
                service = self.service,
                code = record.code,
                message = %record.message,
                cause = record.cause.as_deref().unwrap_or(""),
                "request failed"
            );
        } else {
            tracing::warn!(
                service = self.service,
                code = record.code,
                message = %record.message,
                "request rejected"
            );
        }
    }

    /// Close the logger. Returns `false` if it was already closed.
    pub fn shutdown(&self) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        tracing::info!(service = self.service, "logger shut down");
        true
    }
}

/// Elapsed wall time in seconds with five decimals.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.5}", elapsed.as_secs_f64())
}
