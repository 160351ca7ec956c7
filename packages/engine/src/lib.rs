//! # Pushgate engine
//!
//! Selector and push-decision engine for an HTTP/2 Server Push gateway.
//! Clients declare which parts of a JSON or JSON-LD response they want
//! (`fields`) and which linked resources should be delivered ahead of time
//! (`preload`); this crate turns those declarations into a pruned body, a set
//! of push promises, and `Link: rel=preload` fallbacks.
//!
//! ## Pipeline
//!
//! - [`selector`] parses `fields` / `preload` values coming from headers and
//!   query strings
//! - [`matcher`] walks the decoded document and yields concrete node paths
//! - [`relation`] turns a matched node into the URL of a related resource,
//!   through JSON-LD semantics or an OpenAPI description
//! - [`projector`] prunes the document to the requested fields
//! - [`push`] dedups, budgets, and either pushes or links every relation
//!
//! ## Usage
//!
//! ```rust
//! use pushgate_engine::prelude::*;
//! use serde_json::json;
//!
//! let document = json!({"hydra:member": [{"author": "/authors/1"}, {"author": "/authors/2"}]});
//! let selector = parse_selector("/hydra:member/*/author").expect("valid selector");
//!
//! let mode = DocumentMode::default();
//! let matcher = TreeMatcher::new(&mode, &document);
//! let nodes = matcher.find(&document, &selector, 0);
//! assert_eq!(nodes.len(), 2);
//! assert_eq!(nodes[0].path.to_string(), "hydra:member/0/author");
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod matcher;
pub mod projector;
pub mod push;
pub mod relation;
pub mod selector;
pub mod telemetry;

// Prelude with canonical types
pub mod prelude;

pub use crate::prelude::*;
