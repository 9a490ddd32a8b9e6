//! Trie node keyed by one path segment.
//!
//! # Responsibilities
//! - Hold literal children by exact segment
//! - Hold at most one parametric (`:name`) and one wildcard (`*name`) child
//! - Record the registered pattern and value at leaves
//!
//! # Design Decisions
//! - Wildcard nodes are terminal; registration rejects segments after them
//! - A second parametric child with a different name is rejected, so a
//!   segment position always binds the same parameter name
//! - Resolution backtracks: a literal branch that dead-ends falls back to
//!   the parametric branch, then the wildcard

use std::collections::HashMap;

use crate::error::RouteError;

/// Classification of a single pattern segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Literal(&'a str),
    Param(&'a str),
    Wildcard(&'a str),
}

impl<'a> Segment<'a> {
    pub(crate) fn parse(segment: &'a str) -> Self {
        if let Some(name) = segment.strip_prefix(':') {
            Segment::Param(name)
        } else if let Some(name) = segment.strip_prefix('*') {
            Segment::Wildcard(name)
        } else {
            Segment::Literal(segment)
        }
    }
}

/// Validate a split pattern before any node is created.
pub(crate) fn validate(pattern: &str, segments: &[&str]) -> Result<(), RouteError> {
    for (i, raw) in segments.iter().enumerate() {
        match Segment::parse(raw) {
            Segment::Param(name) | Segment::Wildcard(name) if name.is_empty() => {
                return Err(RouteError::EmptyParamName {
                    pattern: pattern.to_string(),
                });
            }
            Segment::Wildcard(_) if i + 1 != segments.len() => {
                return Err(RouteError::WildcardNotLast {
                    pattern: pattern.to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(())
}

pub(crate) struct RouteNode<V> {
    /// Raw segment text (`users`, `:id`, `*filepath`); empty for the root.
    segment: String,
    /// Normalized full pattern, set when this node is a leaf.
    pattern: Option<String>,
    value: Option<V>,
    literals: HashMap<String, RouteNode<V>>,
    param: Option<Box<RouteNode<V>>>,
    wildcard: Option<Box<RouteNode<V>>>,
}

impl<V> RouteNode<V> {
    pub(crate) fn root() -> Self {
        Self::with_segment(String::new())
    }

    fn with_segment(segment: String) -> Self {
        Self {
            segment,
            pattern: None,
            value: None,
            literals: HashMap::new(),
            param: None,
            wildcard: None,
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn pattern(&self) -> &str {
        self.pattern.as_deref().unwrap_or("")
    }

    pub(crate) fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Parameter name for `:name` and `*name` nodes.
    fn name(&self) -> &str {
        &self.segment[1..]
    }

    /// Insert `value` at the node addressed by `segments`.
    ///
    /// The segments must already have passed [`validate`]. Returns the value
    /// previously stored for the same pattern, if any.
    pub(crate) fn insert(
        &mut self,
        pattern: &str,
        segments: &[&str],
        value: V,
    ) -> Result<Option<V>, RouteError> {
        let mut node = self;

        for raw in segments {
            node = match Segment::parse(raw) {
                Segment::Literal(literal) => node
                    .literals
                    .entry(literal.to_string())
                    .or_insert_with(|| RouteNode::with_segment(literal.to_string())),
                Segment::Param(_) => {
                    let child = node
                        .param
                        .get_or_insert_with(|| Box::new(RouteNode::with_segment(raw.to_string())));
                    check_name(pattern, child, raw)?;
                    child.as_mut()
                }
                Segment::Wildcard(_) => {
                    let child = node
                        .wildcard
                        .get_or_insert_with(|| Box::new(RouteNode::with_segment(raw.to_string())));
                    check_name(pattern, child, raw)?;
                    child.as_mut()
                }
            };
        }

        node.pattern = Some(format!("/{}", segments.join("/")));
        Ok(node.value.replace(value))
    }

    /// Find the leaf matching `segments`, pushing bound parameters.
    ///
    /// On `None`, `params` is left as it was on entry.
    pub(crate) fn search<'n>(
        &'n self,
        segments: &[&str],
        params: &mut Vec<(String, String)>,
    ) -> Option<&'n RouteNode<V>> {
        let Some((first, rest)) = segments.split_first() else {
            if self.is_leaf() {
                return Some(self);
            }
            // `/assets` still reaches `/assets/*filepath` with an empty remainder.
            return match &self.wildcard {
                Some(wild) if wild.is_leaf() => {
                    params.push((wild.name().to_string(), String::new()));
                    Some(wild.as_ref())
                }
                _ => None,
            };
        };

        if let Some(child) = self.literals.get(*first) {
            if let Some(found) = child.search(rest, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param {
            params.push((child.name().to_string(), (*first).to_string()));
            if let Some(found) = child.search(rest, params) {
                return Some(found);
            }
            params.pop();
        }

        match &self.wildcard {
            Some(wild) if wild.is_leaf() => {
                params.push((wild.name().to_string(), segments.join("/")));
                Some(wild.as_ref())
            }
            _ => None,
        }
    }

    /// Collect every registered pattern below this node.
    pub(crate) fn collect_patterns(&self, out: &mut Vec<String>) {
        if let Some(pattern) = &self.pattern {
            if self.is_leaf() {
                out.push(pattern.clone());
            }
        }
        for child in self.literals.values() {
            child.collect_patterns(out);
        }
        if let Some(child) = &self.param {
            child.collect_patterns(out);
        }
        if let Some(child) = &self.wildcard {
            child.collect_patterns(out);
        }
    }
}

fn check_name<V>(pattern: &str, child: &RouteNode<V>, requested: &str) -> Result<(), RouteError> {
    if child.segment == requested {
        Ok(())
    } else {
        Err(RouteError::ParamConflict {
            pattern: pattern.to_string(),
            existing: child.segment.clone(),
            requested: requested.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::split_path;

    fn insert(root: &mut RouteNode<u32>, pattern: &str, value: u32) -> Result<Option<u32>, RouteError> {
        let segments = split_path(pattern);
        validate(pattern, &segments)?;
        root.insert(pattern, &segments, value)
    }

    fn find(root: &RouteNode<u32>, path: &str) -> Option<(u32, Vec<(String, String)>)> {
        let mut params = Vec::new();
        let segments = split_path(path);
        root.search(&segments, &mut params)
            .and_then(|n| n.value().copied())
            .map(|v| (v, params))
    }

    #[test]
    fn test_segment_parse() {
        assert_eq!(Segment::parse("users"), Segment::Literal("users"));
        assert_eq!(Segment::parse(":id"), Segment::Param("id"));
        assert_eq!(Segment::parse("*filepath"), Segment::Wildcard("filepath"));
    }

    #[test]
    fn test_validate_rejects_wildcard_in_middle() {
        let segments = split_path("/static/*path/more");
        assert!(matches!(
            validate("/static/*path/more", &segments),
            Err(RouteError::WildcardNotLast { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let segments = split_path("/user/:");
        assert!(matches!(
            validate("/user/:", &segments),
            Err(RouteError::EmptyParamName { .. })
        ));
    }

    #[test]
    fn test_param_conflict_leaves_first_name() {
        let mut root = RouteNode::root();
        insert(&mut root, "/:id", 1).unwrap();
        let err = insert(&mut root, "/:name", 2).unwrap_err();
        assert_eq!(
            err,
            RouteError::ParamConflict {
                pattern: "/:name".into(),
                existing: ":id".into(),
                requested: ":name".into(),
            }
        );

        let (value, params) = find(&root, "/7").unwrap();
        assert_eq!(value, 1);
        assert_eq!(params, vec![("id".to_string(), "7".to_string())]);
    }

    #[test]
    fn test_backtracks_from_dead_literal_branch() {
        let mut root = RouteNode::root();
        insert(&mut root, "/user/new", 1).unwrap();
        insert(&mut root, "/user/:id/profile", 2).unwrap();

        let (value, params) = find(&root, "/user/new/profile").unwrap();
        assert_eq!(value, 2);
        assert_eq!(params, vec![("id".to_string(), "new".to_string())]);
    }

    #[test]
    fn test_failed_search_leaves_params_untouched() {
        let mut root = RouteNode::root();
        insert(&mut root, "/a/:x/b", 1).unwrap();

        let mut params = Vec::new();
        let segments = split_path("/a/1/c");
        assert!(root.search(&segments, &mut params).is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn test_interior_node_is_not_a_match() {
        let mut root = RouteNode::root();
        insert(&mut root, "/a/b/c", 1).unwrap();
        assert!(find(&root, "/a/b").is_none());
        assert!(find(&root, "/a/b/c/d").is_none());
    }

    #[test]
    fn test_collect_patterns() {
        let mut root = RouteNode::root();
        insert(&mut root, "/", 0).unwrap();
        insert(&mut root, "/a/:b", 1).unwrap();
        insert(&mut root, "/c/*rest", 2).unwrap();

        let mut patterns = Vec::new();
        root.collect_patterns(&mut patterns);
        patterns.sort();
        assert_eq!(patterns, vec!["/", "/a/:b", "/c/*rest"]);
    }
}
