//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Define the request logging collaborator (`RequestLogger`)
//! - Provide the default tracing-backed implementation
//!
//! # Design Decisions
//! - Log records carry structure only (method, path, status, message)
//! - Output format belongs to the subscriber, not to this crate
//! - Log level configurable via config, overridden by `RUST_LOG`

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// One structured log entry emitted by the dispatch core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRecord<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub status: Option<u16>,
    pub message: Option<&'a str>,
}

impl<'a> LogRecord<'a> {
    pub fn new(method: &'a str, path: &'a str) -> Self {
        Self {
            method,
            path,
            status: None,
            message: None,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn message(mut self, message: &'a str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Sink for request-level log events.
///
/// Invoked on committed success statuses (`info`), failure statuses and
/// `fail` calls (`error`), recovered faults (`error`), and each dispatched
/// request (`debug`).
pub trait RequestLogger: Send + Sync {
    fn debug(&self, record: &LogRecord<'_>);
    fn info(&self, record: &LogRecord<'_>);
    fn error(&self, record: &LogRecord<'_>);
}

/// Default [`RequestLogger`] forwarding to `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn debug(&self, r: &LogRecord<'_>) {
        tracing::debug!(method = %r.method, path = %r.path, status = ?r.status, message = ?r.message, "request");
    }

    fn info(&self, r: &LogRecord<'_>) {
        tracing::info!(method = %r.method, path = %r.path, status = ?r.status, message = ?r.message, "request");
    }

    fn error(&self, r: &LogRecord<'_>) {
        tracing::error!(method = %r.method, path = %r.path, status = ?r.status, message = ?r.message, "request");
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level`. Calling this twice
/// is harmless; the second install attempt is ignored.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("sprig={default_level},tower_http={default_level}").into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
