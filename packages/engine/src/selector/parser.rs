//! Selector expression grammar
//!
//! ```text
//! selector := ("/" segment)+
//! segment  := literal | "*"
//! ```
//!
//! Literals are any run of characters other than `/` and `,`, percent-decoded.
//! Selectors come from untrusted client input, so a malformed expression is
//! skipped and logged instead of failing the request.

use super::types::{Segment, Selector};

/// Parse a single selector expression
///
/// Returns `None` when the expression is empty, does not start with `/`,
/// contains an empty segment, or is not valid percent-encoded UTF-8.
#[must_use]
pub fn parse_selector(raw: &str) -> Option<Selector> {
    let raw = raw.trim();
    let Some(body) = raw.strip_prefix('/') else {
        tracing::debug!(selector = raw, "skipping selector not starting with '/'");
        return None;
    };

    let mut segments = Vec::new();
    for part in body.split('/') {
        if part.is_empty() {
            tracing::debug!(selector = raw, "skipping selector with an empty segment");
            return None;
        }

        if part == "*" {
            segments.push(Segment::Wildcard);
            continue;
        }

        match urlencoding::decode(part) {
            Ok(decoded) => segments.push(Segment::Literal(decoded.into_owned())),
            Err(e) => {
                tracing::debug!(selector = raw, error = %e, "skipping selector with invalid encoding");
                return None;
            }
        }
    }

    Selector::from_segments(segments)
}

/// Parse raw header or query values into an ordered, duplicate-free list
///
/// Each value may hold several comma-separated expressions. Order is the
/// order of first appearance across all values.
pub fn parse_values<I, S>(values: I) -> Vec<Selector>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut selectors: Vec<Selector> = Vec::new();

    for value in values {
        for expression in value.as_ref().split(',') {
            if expression.trim().is_empty() {
                continue;
            }

            if let Some(selector) = parse_selector(expression)
                && !selectors.contains(&selector)
            {
                selectors.push(selector);
            }
        }
    }

    selectors
}
