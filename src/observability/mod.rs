//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Context / Dispatcher / Recovery produce:
//!     → logging.rs (RequestLogger collaborator, default TracingLogger)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → tracing-subscriber fmt layer (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The request logger is resolved at startup, before serving begins
//! - Metrics are cheap (atomic increments) and exporter is opt-in

pub mod logging;
pub mod metrics;

pub use logging::{LogRecord, RequestLogger, TracingLogger};
