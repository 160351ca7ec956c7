//! JSON-LD relations and term expansion
//!
//! Relation detection is intentionally permissive: a string that parses as
//! an absolute URL or a relative reference is a relation, as is an object
//! whose `@id` is one. The context only serves selector matching across
//! vocabulary aliases.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use serde_json::Value;
use url::Url;

use super::{RelationResolver, Resolution, Route};
use crate::error::{EngineError, EngineResult};
use crate::matcher::MatchedNode;

static RELATIVE_BASE: LazyLock<Option<Url>> = LazyLock::new(|| Url::parse("http://relation.invalid/").ok());

/// Term definitions of a JSON-LD context
///
/// Holds prefix and term definitions (`"hydra": "http://www.w3.org/ns/hydra/core#"`,
/// `"author": {"@id": "schema:author"}`) and the optional `@vocab`. Remote
/// context references are not fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonLdContext {
    terms: HashMap<String, String>,
    vocab: Option<String>,
}

impl JsonLdContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a context object, an array of them, or a
    /// document carrying an `@context` member
    pub fn from_value(value: &Value) -> EngineResult<Self> {
        let definitions = match value {
            Value::Object(map) => map.get("@context").unwrap_or(value),
            Value::Array(_) => value,
            _ => {
                return Err(EngineError::InvalidDocument(
                    "a JSON-LD context must be an object or an array".to_string(),
                ));
            }
        };

        let mut context = Self::new();
        context.absorb(definitions);
        Ok(context)
    }

    /// Load a context file
    pub fn from_path(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::io(path, e))?;
        let value: Value = serde_json::from_str(&text).map_err(EngineError::Decode)?;
        Self::from_value(&value)
    }

    /// Add a term or prefix definition
    #[must_use]
    pub fn define(mut self, term: impl Into<String>, iri: impl Into<String>) -> Self {
        self.terms.insert(term.into(), iri.into());
        self
    }

    /// Set the default vocabulary used for bare terms
    #[must_use]
    pub fn with_vocab(mut self, vocab: impl Into<String>) -> Self {
        self.vocab = Some(vocab.into());
        self
    }

    /// This context extended with a document's inline `@context`
    ///
    /// Inline definitions win over startup ones. String entries (remote
    /// context references) are ignored.
    #[must_use]
    pub fn merged(&self, inline: &Value) -> Self {
        let mut merged = self.clone();
        merged.absorb(inline);
        merged
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.vocab.is_none()
    }

    /// Expand a term, compact IRI, or absolute IRI
    ///
    /// Keywords (`@id`, `@type`, ...) and absolute IRIs expand to themselves.
    /// Returns `None` for a bare term this context does not define.
    #[must_use]
    pub fn expand(&self, term: &str) -> Option<String> {
        if term.starts_with('@') {
            return Some(term.to_owned());
        }

        if let Some(definition) = self.terms.get(term) {
            return Some(self.expand_iri(definition));
        }

        if term.contains(':') {
            return Some(self.expand_iri(term));
        }

        self.vocab.as_ref().map(|vocab| format!("{vocab}{term}"))
    }

    /// Expand a compact IRI through the prefix definitions, without term lookup
    fn expand_iri(&self, iri: &str) -> String {
        match iri.split_once(':') {
            Some((prefix, suffix)) if !suffix.starts_with("//") => match self.terms.get(prefix) {
                Some(namespace) => format!("{namespace}{suffix}"),
                None => iri.to_owned(),
            },
            _ => iri.to_owned(),
        }
    }

    fn absorb(&mut self, definitions: &Value) {
        match definitions {
            Value::Array(items) => {
                for item in items {
                    self.absorb(item);
                }
            }
            Value::Object(map) => {
                for (term, definition) in map {
                    if term == "@vocab" {
                        if let Some(vocab) = definition.as_str() {
                            self.vocab = Some(vocab.to_owned());
                        }
                        continue;
                    }
                    if term.starts_with('@') {
                        continue;
                    }

                    let iri = match definition {
                        Value::String(iri) => Some(iri.as_str()),
                        Value::Object(expanded) => expanded.get("@id").and_then(Value::as_str),
                        _ => None,
                    };
                    if let Some(iri) = iri {
                        self.terms.insert(term.clone(), iri.to_owned());
                    }
                }
            }
            _ => {}
        }
    }
}

impl RelationResolver for JsonLdContext {
    fn resolve(&self, node: &MatchedNode<'_>, _document: &Value, _route: &Route<'_>) -> Resolution {
        let candidate = match node.value {
            Value::String(url) => Some(url.as_str()),
            Value::Object(map) => map.get("@id").and_then(Value::as_str),
            _ => None,
        };

        match candidate {
            Some(url) if is_link(url) => Resolution::Relation(url.to_owned()),
            _ => Resolution::NotARelation,
        }
    }
}

/// Whether a string is syntactically an absolute URL or a relative reference
#[must_use]
pub fn is_link(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.chars().any(char::is_whitespace) {
        return false;
    }

    match RELATIVE_BASE.as_ref() {
        Some(base) => base.join(candidate).is_ok(),
        None => Url::parse(candidate).is_ok(),
    }
}
