//! Decoding and encoding of upstream JSON bodies
//!
//! The body is decoded once per request and shared read-only by the matcher,
//! the relation resolvers and the projector.

use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// Decode an upstream body into a JSON tree
pub fn decode(body: &[u8]) -> EngineResult<Value> {
    serde_json::from_slice(body).map_err(EngineError::Decode)
}

/// Serialize a JSON tree back to the compact encoding
pub fn encode(document: &Value) -> EngineResult<Vec<u8>> {
    serde_json::to_vec(document).map_err(EngineError::Encode)
}

/// Whether a `Content-Type` value denotes a JSON body this engine can process
///
/// Accepts `application/json`, `application/ld+json` and any other
/// `+json` structured syntax suffix, ignoring parameters and case.
#[must_use]
pub fn is_json(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence == "application/json" || essence.ends_with("+json")
}
