//! Core selector types
//!
//! A selector is an immutable, ordered sequence of segments rooted at the
//! document root, written `/segment/segment/...`.

use std::fmt;

/// Individual segment of a selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member name, array index in decimal form, or compacted JSON-LD term
    Literal(String),
    /// `*` - every key of an object or every index of an array
    Wildcard,
}

impl Segment {
    /// Whether this segment selects the given array index
    #[inline]
    #[must_use]
    pub fn matches_index(&self, index: usize) -> bool {
        match self {
            Segment::Wildcard => true,
            Segment::Literal(literal) => literal.parse::<usize>() == Ok(index),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Wildcard => f.write_str("*"),
            Segment::Literal(literal) => f.write_str(&escape_literal(literal)),
        }
    }
}

/// A parsed `fields` or `preload` expression
///
/// The canonical string form is computed once at construction and used for
/// deduplication and for forwarding the selector to pushed resources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    segments: Vec<Segment>,
    canonical: String,
}

impl Selector {
    /// Build a selector from already decoded segments
    ///
    /// Returns `None` for an empty segment list: a selector always names at
    /// least one segment below the root.
    #[must_use]
    pub fn from_segments(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }

        let canonical = segments.iter().fold(String::new(), |mut acc, segment| {
            acc.push('/');
            acc.push_str(&segment.to_string());
            acc
        });

        Some(Self {
            segments,
            canonical,
        })
    }

    /// Get the selector segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a constructed selector
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Canonical `/a/b/*` form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    /// The segments from `depth` on, as a new root-relative selector
    #[must_use]
    pub fn suffix(&self, depth: usize) -> Option<Selector> {
        self.segments
            .get(depth..)
            .and_then(|rest| Selector::from_segments(rest.to_vec()))
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// Which request input a selector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    /// Projection of the response body
    Fields,
    /// Related resources to push or announce
    Preload,
}

impl SelectorKind {
    pub const ALL: [SelectorKind; 2] = [SelectorKind::Fields, SelectorKind::Preload];

    /// Request header carrying this kind (matched case-insensitively)
    #[inline]
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            SelectorKind::Fields => "fields",
            SelectorKind::Preload => "preload",
        }
    }

    /// Query-string parameter carrying this kind
    #[inline]
    #[must_use]
    pub const fn query_key(self) -> &'static str {
        self.header_name()
    }
}

/// Surface form(s) a selector kind arrived through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectorSource {
    pub header: bool,
    pub query: bool,
}

impl SelectorSource {
    /// Downstream selectors travel in the query string when the client used it
    #[inline]
    #[must_use]
    pub fn prefers_query(self) -> bool {
        self.query
    }
}

/// Escape the characters that would change how a literal re-parses
fn escape_literal(literal: &str) -> String {
    if literal == "*" {
        return "%2A".to_string();
    }

    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            ',' => escaped.push_str("%2C"),
            _ => escaped.push(c),
        }
    }
    escaped
}
