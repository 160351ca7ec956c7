//! Tree matching
//!
//! Evaluates selectors against a decoded JSON document and yields the
//! concrete location of every matched node.

pub mod matched;
pub mod path;
pub mod walker;

// Re-export main types for convenience
pub use matched::{MatchSet, MatchedNode};
pub use path::{NodePath, PathSegment};
pub use walker::TreeMatcher;
