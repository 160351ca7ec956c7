//! Matched nodes and their ordered, deduplicated collection

use std::collections::HashSet;

use serde_json::Value;

use super::path::NodePath;

/// A node reached by a selector
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedNode<'a> {
    /// Concrete location, wildcards expanded
    pub path: NodePath,
    /// The value found there
    pub value: &'a Value,
    /// Index of the selector that produced this node
    pub selector: usize,
}

impl<'a> MatchedNode<'a> {
    #[must_use]
    pub fn new(path: NodePath, value: &'a Value, selector: usize) -> Self {
        Self {
            path,
            value,
            selector,
        }
    }

    /// Number of selector segments consumed to reach this node
    #[inline]
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.path.depth()
    }
}

/// Union of the matches of several selectors
///
/// Keeps first-seen order; a path already present is ignored.
#[derive(Debug, Clone, Default)]
pub struct MatchSet<'a> {
    nodes: Vec<MatchedNode<'a>>,
    seen: HashSet<NodePath>,
}

impl<'a> MatchSet<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node unless its path is already present
    pub fn insert(&mut self, node: MatchedNode<'a>) -> bool {
        if !self.seen.insert(node.path.clone()) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MatchedNode<'a>> {
        self.nodes.iter()
    }

    /// Matched paths in match order
    pub fn paths(&self) -> impl Iterator<Item = &NodePath> {
        self.nodes.iter().map(|node| &node.path)
    }

    #[must_use]
    pub fn contains(&self, path: &NodePath) -> bool {
        self.seen.contains(path)
    }
}

impl<'a> Extend<MatchedNode<'a>> for MatchSet<'a> {
    fn extend<T: IntoIterator<Item = MatchedNode<'a>>>(&mut self, iter: T) {
        for node in iter {
            self.insert(node);
        }
    }
}

impl<'s, 'a> IntoIterator for &'s MatchSet<'a> {
    type Item = &'s MatchedNode<'a>;
    type IntoIter = std::slice::Iter<'s, MatchedNode<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
