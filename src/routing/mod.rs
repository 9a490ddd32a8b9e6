//! Path matching subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     (method, pattern, handler)
//!     → split_path (drop empty segments)
//!     → node.rs (descend/create literal, `:param`, `*wildcard` children)
//!     → leaf records pattern + handler
//!
//! Resolution (per request):
//!     (method, path)
//!     → router.rs (pick the method's trie root)
//!     → node.rs (literal first, then parametric, then wildcard)
//!     → RouteMatch { value, params, pattern } or None
//! ```
//!
//! # Design Decisions
//! - One trie root per method, owned by the Router (no globals)
//! - Append-only: nodes are never removed
//! - Immutable after startup; shared across requests without locks
//! - Same (method, pattern) registered twice: last registration wins

mod node;
pub mod router;

use std::collections::HashMap;

pub use router::{RouteMatch, Router};

/// Split a pattern or request path into its non-empty segments.
///
/// Leading, trailing and repeated slashes are dropped, so `/a//b/` and `a/b`
/// produce the same segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Parameters bound while resolving a path.
///
/// Populated once at resolution time and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: HashMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().collect(),
        }
    }
}
