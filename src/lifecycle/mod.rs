//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every ShutdownSignal observes it
//!     → HttpServer stops accepting
//!
//! In-flight work (in_flight.rs):
//!     Context::track_work / add_wait → counter up
//!     guard dropped / done → counter down
//!     HttpServer waits for zero (bounded) before returning
//! ```
//!
//! # Design Decisions
//! - Handlers observe shutdown; the chain never enforces cancellation
//! - Drain has a deadline: forced return after `timeouts.shutdown_secs`

pub mod in_flight;
pub mod shutdown;
pub mod signals;

pub use in_flight::{InFlight, InFlightGuard};
pub use shutdown::{Shutdown, ShutdownSignal};
