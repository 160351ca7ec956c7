//! Depth-first selector evaluation
//!
//! Literal segments descend into one object member or array index, `*` fans
//! out over every member or index in document order. Reaching the end of the
//! selector yields the node whatever its type. A branch that cannot continue
//! is pruned without error.
//!
//! A string or number reached with segments left over is a link boundary:
//! the walk stops and yields that node, and the leftover segments become the
//! selectors forwarded to the related resource.

use std::borrow::Cow;

use serde_json::{Map, Value};

use super::matched::{MatchSet, MatchedNode};
use super::path::{NodePath, PathSegment};
use crate::relation::{DocumentMode, JsonLdContext};
use crate::selector::{Segment, Selector};

/// Evaluates selectors against one decoded document
///
/// In JSON-LD mode the matcher carries the startup context merged with the
/// document's inline `@context`, so a literal written with one vocabulary
/// alias also matches a key emitted with another.
#[derive(Debug, Clone)]
pub struct TreeMatcher<'c> {
    context: Option<Cow<'c, JsonLdContext>>,
}

impl<'c> TreeMatcher<'c> {
    /// Create a matcher for a document under the configured document mode
    #[must_use]
    pub fn new(mode: &'c DocumentMode, document: &Value) -> Self {
        let context = mode.jsonld_context().map(|context| match document.get("@context") {
            Some(inline) => Cow::Owned(context.merged(inline)),
            None => Cow::Borrowed(context),
        });

        Self { context }
    }

    /// A matcher comparing raw keys only
    #[must_use]
    pub fn literal() -> TreeMatcher<'static> {
        TreeMatcher { context: None }
    }

    /// Nodes reached by one selector, in document order
    ///
    /// `index` is recorded on every node as the producing selector.
    #[must_use]
    pub fn find<'v>(&self, document: &'v Value, selector: &Selector, index: usize) -> Vec<MatchedNode<'v>> {
        let mut out = Vec::new();
        let mut path = NodePath::root();
        self.walk(document, selector.segments(), &mut path, index, &mut out);
        out
    }

    /// Union of the nodes reached by every selector
    ///
    /// Selectors are evaluated independently and concatenated in order;
    /// a path reached twice keeps its first position.
    #[must_use]
    pub fn find_all<'v>(&self, document: &'v Value, selectors: &[Selector]) -> MatchSet<'v> {
        let mut set = MatchSet::new();
        for (index, selector) in selectors.iter().enumerate() {
            set.extend(self.find(document, selector, index));
        }
        set
    }

    /// Whether a literal segment designates a document key
    #[must_use]
    pub fn key_matches(&self, literal: &str, key: &str) -> bool {
        if literal == key {
            return true;
        }

        match &self.context {
            Some(context) => match (context.expand(literal), context.expand(key)) {
                (Some(expected), Some(actual)) => expected == actual,
                _ => false,
            },
            None => false,
        }
    }

    /// Segments of `selector` beyond `path`, when `selector` passes through it
    ///
    /// Returns `None` when the selector diverges from the path or ends at or
    /// before it.
    #[must_use]
    pub fn remainder(&self, selector: &Selector, path: &NodePath) -> Option<Selector> {
        if selector.len() <= path.depth() {
            return None;
        }

        let passes_through = selector
            .segments()
            .iter()
            .zip(path.segments())
            .all(|(segment, step)| match (segment, step) {
                (Segment::Wildcard, _) => true,
                (Segment::Literal(literal), PathSegment::Key(key)) => self.key_matches(literal, key),
                (literal @ Segment::Literal(_), PathSegment::Index(index)) => literal.matches_index(*index),
            });

        if passes_through {
            selector.suffix(path.depth())
        } else {
            None
        }
    }

    fn walk<'v>(
        &self,
        value: &'v Value,
        segments: &[Segment],
        path: &mut NodePath,
        selector: usize,
        out: &mut Vec<MatchedNode<'v>>,
    ) {
        let Some((head, rest)) = segments.split_first() else {
            out.push(MatchedNode::new(path.clone(), value, selector));
            return;
        };

        match value {
            Value::Object(map) => match head {
                Segment::Wildcard => {
                    for (key, child) in map {
                        path.push(PathSegment::Key(key.clone()));
                        self.walk(child, rest, path, selector, out);
                        path.pop();
                    }
                }
                Segment::Literal(literal) => {
                    if let Some((key, child)) = self.lookup(map, literal) {
                        path.push(PathSegment::Key(key.to_owned()));
                        self.walk(child, rest, path, selector, out);
                        path.pop();
                    }
                }
            },
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    if head.matches_index(index) {
                        path.push(PathSegment::Index(index));
                        self.walk(child, rest, path, selector, out);
                        path.pop();
                    }
                }
            }
            Value::String(_) | Value::Number(_) => {
                out.push(MatchedNode::new(path.clone(), value, selector));
            }
            Value::Bool(_) | Value::Null => {}
        }
    }

    fn lookup<'m>(&self, map: &'m Map<String, Value>, literal: &str) -> Option<(&'m str, &'m Value)> {
        if let Some((key, child)) = map.iter().find(|(key, _)| key.as_str() == literal) {
            return Some((key.as_str(), child));
        }

        let context = self.context.as_ref()?;
        let expected = context.expand(literal)?;
        map.iter()
            .find(|(key, _)| context.expand(key).as_deref() == Some(expected.as_str()))
            .map(|(key, child)| (key.as_str(), child))
    }
}
