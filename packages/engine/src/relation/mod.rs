//! Relation resolution
//!
//! Turns a matched `preload` node into the URL of the related resource.
//! Two strategies share one contract and are chosen once at startup:
//!
//! - [`JsonLdContext`]: any URL-shaped string, or object with such an `@id`,
//!   is a relation
//! - [`OpenApiDocument`]: relations are the OpenAPI Links declared on the
//!   operation that produced the response
//!
//! Resolution never fails loudly: anything that is not a relation yields
//! [`Resolution::NotARelation`] and the node is skipped.

pub mod jsonld;
pub mod openapi;

use http::Method;
use serde_json::Value;

use crate::matcher::MatchedNode;

pub use jsonld::JsonLdContext;
pub use openapi::OpenApiDocument;

/// Outcome of resolving one matched node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Absolute or upstream-relative URL of the related resource
    Relation(String),
    NotARelation,
}

/// The request that produced the document being resolved
#[derive(Debug, Clone, Copy)]
pub struct Route<'r> {
    pub method: &'r Method,
    /// Request path, without query string
    pub path: &'r str,
}

impl<'r> Route<'r> {
    #[must_use]
    pub fn new(method: &'r Method, path: &'r str) -> Self {
        Self { method, path }
    }
}

/// Strategy turning matched nodes into relations
pub trait RelationResolver: Send + Sync {
    /// Resolve one node of `document`; must not have side effects
    fn resolve(&self, node: &MatchedNode<'_>, document: &Value, route: &Route<'_>) -> Resolution;
}

/// Document context loaded at startup and shared read-only by all requests
#[derive(Debug, Clone)]
pub enum DocumentMode {
    JsonLd(JsonLdContext),
    OpenApi(OpenApiDocument),
}

impl DocumentMode {
    /// The JSON-LD context, when running in JSON-LD mode
    #[must_use]
    pub fn jsonld_context(&self) -> Option<&JsonLdContext> {
        match self {
            DocumentMode::JsonLd(context) => Some(context),
            DocumentMode::OpenApi(_) => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            DocumentMode::JsonLd(_) => "json-ld",
            DocumentMode::OpenApi(_) => "openapi",
        }
    }
}

impl Default for DocumentMode {
    fn default() -> Self {
        DocumentMode::JsonLd(JsonLdContext::default())
    }
}

impl RelationResolver for DocumentMode {
    fn resolve(&self, node: &MatchedNode<'_>, document: &Value, route: &Route<'_>) -> Resolution {
        match self {
            DocumentMode::JsonLd(context) => context.resolve(node, document, route),
            DocumentMode::OpenApi(openapi) => openapi.resolve(node, document, route),
        }
    }
}
