//! Route table: one trie root per HTTP method.
//!
//! # Responsibilities
//! - Register (method, pattern) → value associations
//! - Resolve (method, path) to the value plus bound parameters
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Methods are independent: a GET route never answers a POST
//! - Precedence: literal, then `:param`, then `*wildcard`
//! - Re-registering the same (method, pattern) overwrites; logged as a warning
//! - Request segments are percent-decoded one by one before matching, so an
//!   encoded `/` stays inside its segment

use std::borrow::Cow;
use std::collections::HashMap;

use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::error::RouteError;
use crate::routing::node::{self, RouteNode};
use crate::routing::{split_path, Params};

/// Result of a successful resolution.
pub struct RouteMatch<'a, V> {
    pub value: &'a V,
    pub params: Params,
    /// The normalized registered pattern, e.g. `/user/:id`.
    pub pattern: &'a str,
}

/// Prefix-tree route table keyed by method.
pub struct Router<V> {
    roots: HashMap<Method, RouteNode<V>>,
    len: usize,
}

impl<V> Default for Router<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Router<V> {
    pub fn new() -> Self {
        Self {
            roots: HashMap::new(),
            len: 0,
        }
    }

    /// Register `value` for `method` and `pattern`.
    ///
    /// Returns the previously registered value when the same pattern was
    /// already present for this method (last registration wins).
    pub fn add_route(&mut self, method: Method, pattern: &str, value: V) -> Result<Option<V>, RouteError> {
        let segments = split_path(pattern);
        node::validate(pattern, &segments)?;

        let root = self.roots.entry(method.clone()).or_insert_with(RouteNode::root);
        let previous = root.insert(pattern, &segments, value)?;

        if previous.is_some() {
            tracing::warn!(
                method = %method,
                pattern = %pattern,
                "Route registered twice, previous handler replaced"
            );
        } else {
            self.len += 1;
            tracing::debug!(method = %method, pattern = %pattern, "Route registered");
        }

        Ok(previous)
    }

    /// Resolve a request path for `method`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, V>> {
        let root = self.roots.get(method)?;
        let decoded: Vec<Cow<'_, str>> = split_path(path)
            .into_iter()
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy())
            .collect();
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();
        let mut bound = Vec::new();

        let leaf = root.search(&segments, &mut bound)?;
        let value = leaf.value()?;

        Some(RouteMatch {
            value,
            params: bound.into_iter().collect(),
            pattern: leaf.pattern(),
        })
    }

    /// All registered (method, pattern) pairs, sorted for stable output.
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut out = Vec::new();
        for (method, root) in &self.roots {
            let mut patterns = Vec::new();
            root.collect_patterns(&mut patterns);
            out.extend(patterns.into_iter().map(|p| (method.clone(), p)));
        }
        out.sort_by(|a, b| (a.0.as_str(), &a.1).cmp(&(b.0.as_str(), &b.1)));
        out
    }

    /// Number of distinct (method, pattern) registrations.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
