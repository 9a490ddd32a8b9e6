//! Dispatch subsystem: the Engine and its route groups.
//!
//! # Data Flow
//! ```text
//! Registration (startup, `&mut Engine`):
//!     engine.group("/api") → RouterGroup (prefix, middleware)
//!     group.get("/users/:id", handler) → Router::add_route("/api/users/:id")
//!
//! Dispatch (per request, `&Engine`):
//!     Request
//!     → every group whose prefix starts the path contributes its middleware,
//!       in group creation order
//!     → Router::resolve → handler + params, or the not-found responder
//!     → Context { chain = middleware + [handler] } → next()
//!     → Response
//! ```
//!
//! # Design Decisions
//! - Registration needs `&mut Engine`, dispatch needs `&Engine`: once the
//!   engine is moved into an `Arc` for serving, the tables are frozen
//! - Groups are a flat list for middleware resolution; the parent link is
//!   kept for prefix derivation only
//! - Unmatched requests still run through matching middleware

pub mod engine;
pub mod group;

pub use engine::Engine;
pub use group::RouterGroup;
