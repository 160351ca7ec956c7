//! Selector parsing
//!
//! Decomposed parser for the `fields` and `preload` path expressions:
//! segment and selector types, the expression grammar, and the collection
//! step that unifies the header and query-string forms of both inputs.

pub mod parser;
pub mod set;
pub mod types;

// Re-export main types
pub use parser::{parse_selector, parse_values};
pub use set::SelectorSet;
pub use types::{Segment, Selector, SelectorKind, SelectorSource};
