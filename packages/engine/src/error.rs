//! Engine error types
//!
//! Only document decoding, re-serialization and startup loading can fail.
//! Selector parse errors, match misses and relation misses degrade silently
//! and never reach this module.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to decode JSON document: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode JSON document: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid OpenAPI description: {0}")]
    InvalidOpenApi(#[source] serde_yaml::Error),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }
}

/// Failure to deliver a push promise
///
/// A push failure only abandons the push; the caller falls back to a
/// `Link` header and the primary response is unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PushError {
    #[error("server push is not available on this connection")]
    Unsupported,

    #[error("push promise refused: {0}")]
    Refused(String),

    #[error("invalid push target: {0}")]
    InvalidTarget(String),
}
