//! Gateway configuration structure and field definitions

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Gateway configuration
///
/// Everything the gateway reads at startup: where to listen, which upstream
/// to proxy, how many resources a request may push, how relations are
/// recognized, and the optional TLS material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Address the listener binds to
    pub addr: SocketAddr,

    /// Base URL of the proxied API, `http://` only
    pub upstream: Option<Url>,

    /// Pushes allowed per client request: `-1` unlimited, `0` disabled
    pub max_pushes: i64,

    /// Maximum nesting depth of pushed sub-requests that may push again
    pub max_push_depth: Option<usize>,

    /// OpenAPI description (YAML or JSON); switches relation detection to
    /// OpenAPI links
    pub openapi_file: Option<PathBuf>,

    /// JSON-LD context used to match selectors across vocabulary aliases
    pub jsonld_context_file: Option<PathBuf>,

    /// PEM certificate chain; TLS is enabled when set together with `key_file`
    pub cert_file: Option<PathBuf>,

    /// PEM private key
    pub key_file: Option<PathBuf>,

    /// Deadline for one upstream request, body included
    pub upstream_timeout: Duration,
}

impl GatewayConfig {
    /// Whether the listener terminates TLS
    #[inline]
    #[must_use]
    pub fn tls_enabled(&self) -> bool {
        self.cert_file.is_some() && self.key_file.is_some()
    }
}
