//! Gateway error types
//!
//! Only startup and connection-level failures surface as [`GatewayError`].
//! A failure while processing one request degrades that response instead:
//! the upstream response passes through unchanged, or the client gets
//! `502 Bad Gateway` when the upstream could not be reached at all.

use std::time::Duration;

use pushgate_engine::EngineError;
use thiserror::Error;

use crate::config::ConfigurationError;

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream did not answer within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("invalid HTTP message: {0}")]
    Http(#[from] http::Error),

    #[error("HTTP/2 error: {0}")]
    H2(#[from] h2::Error),

    #[error("HTTP/1 error: {0}")]
    Hyper(#[from] hyper::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl GatewayError {
    pub(crate) fn tls(error: impl std::fmt::Display) -> Self {
        Self::Tls(error.to_string())
    }

    pub(crate) fn upstream(error: impl std::fmt::Display) -> Self {
        Self::Upstream(error.to_string())
    }
}
