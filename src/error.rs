//! Error types shared across the dispatch engine.
//!
//! # Taxonomy
//! - `RouteError`: rejected at registration time (startup)
//! - `DispatchError`: what happened to a single request
//! - `ServerError`: transport binding failures
//!
//! # Design Decisions
//! - Registration errors are returned, never panicked
//! - Dispatch errors are recorded on the Context, not propagated; the
//!   response has already been written through the single commit path

use thiserror::Error;

use crate::config::loader::ConfigError;

/// Errors raised while registering a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("wildcard segment must be the last segment in pattern '{pattern}'")]
    WildcardNotLast { pattern: String },

    #[error("empty parameter name in pattern '{pattern}'")]
    EmptyParamName { pattern: String },

    #[error("'{requested}' in pattern '{pattern}' conflicts with existing '{existing}'")]
    ParamConflict {
        pattern: String,
        existing: String,
        requested: String,
    },
}

/// Outcome classes for a request that did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No route matched the method and path.
    #[error("route not found")]
    RouteNotFound,

    /// A handler called `Context::fail`.
    #[error("handler failed with {status}: {message}")]
    HandlerFailure { status: u16, message: String },

    /// A fault escaped a handler and was caught by the recovery boundary.
    /// Carries the original detail, which must never reach the response body.
    #[error("unrecovered fault: {0}")]
    UnrecoveredFault(String),
}

/// Errors from the HTTP transport binding.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
