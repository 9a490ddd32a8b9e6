//! Built-in middleware.
//!
//! Middleware is an ordinary `HandlerFunc` that calls `Context::next()`.
//! Code before the call runs on the way in, code after it on the way out.

pub mod access_log;
pub mod recovery;

pub use access_log::access_log;
pub use recovery::recovery;
