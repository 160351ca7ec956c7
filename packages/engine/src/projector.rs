//! Field projection
//!
//! Prunes a document to the matched `fields` paths plus the ancestors needed
//! to reach them. Key order among retained members is the document order.
//!
//! Array elements keep their original index: a dropped element that sits
//! before a retained one becomes `null`, trailing dropped elements are
//! removed. Projecting an already projected document with the same
//! selectors is therefore a no-op.

use serde_json::{Map, Value};

use crate::matcher::{MatchSet, PathSegment, TreeMatcher};
use crate::selector::Selector;

/// Prune `document` to the matched paths
///
/// An empty match set yields an empty object.
#[must_use]
pub fn project(document: &Value, matches: &MatchSet<'_>) -> Value {
    if matches.is_empty() {
        return Value::Object(Map::new());
    }

    let paths: Vec<&[PathSegment]> = matches.paths().map(|path| path.segments()).collect();
    retain(document, &paths)
}

/// Match `selectors` and prune `document` to the result
///
/// Without selectors the document is returned unchanged: no projection was
/// requested.
#[must_use]
pub fn project_selectors(document: &Value, matcher: &TreeMatcher<'_>, selectors: &[Selector]) -> Value {
    if selectors.is_empty() {
        return document.clone();
    }

    project(document, &matcher.find_all(document, selectors))
}

fn retain(value: &Value, paths: &[&[PathSegment]]) -> Value {
    if paths.iter().any(|path| path.is_empty()) {
        return value.clone();
    }

    match value {
        Value::Object(map) => {
            let mut kept = Map::new();
            for (key, child) in map {
                let below = descend(paths, |segment| matches!(segment, PathSegment::Key(k) if k == key));
                if !below.is_empty() {
                    kept.insert(key.clone(), retain(child, &below));
                }
            }
            Value::Object(kept)
        }
        Value::Array(items) => {
            let mut kept = Vec::new();
            for (index, child) in items.iter().enumerate() {
                let below = descend(paths, |segment| matches!(segment, PathSegment::Index(i) if *i == index));
                if !below.is_empty() {
                    kept.resize(index, Value::Null);
                    kept.push(retain(child, &below));
                }
            }
            Value::Array(kept)
        }
        scalar => scalar.clone(),
    }
}

/// Tails of the paths whose first segment satisfies `step`
fn descend<'p>(paths: &[&'p [PathSegment]], step: impl Fn(&PathSegment) -> bool) -> Vec<&'p [PathSegment]> {
    paths
        .iter()
        .filter_map(|path| match path.split_first() {
            Some((first, rest)) if step(first) => Some(rest),
            _ => None,
        })
        .collect()
}
