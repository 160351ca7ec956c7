//! Builder methods for gateway configuration
//!
//! Fluent `with_*` setters, mostly used by tests and embedders that build
//! the configuration in code instead of from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::types::GatewayConfig;

impl GatewayConfig {
    /// Configuration proxying `upstream` with every other setting defaulted
    ///
    /// # Examples
    /// ```no_run
    /// use pushgate::config::GatewayConfig;
    /// use url::Url;
    ///
    /// let upstream = Url::parse("http://127.0.0.1:3000").expect("valid URL");
    /// let config = GatewayConfig::new(upstream).with_max_pushes(2);
    /// assert_eq!(config.max_pushes, 2);
    /// ```
    #[must_use]
    pub fn new(upstream: Url) -> Self {
        Self::default().with_upstream(upstream)
    }

    #[must_use]
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    #[must_use]
    pub fn with_upstream(mut self, upstream: Url) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Set the per-request push ceiling
    ///
    /// `-1` lifts the limit, `0` turns every relation into a `Link` header.
    #[must_use]
    pub fn with_max_pushes(mut self, max_pushes: i64) -> Self {
        self.max_pushes = max_pushes;
        self
    }

    #[must_use]
    pub fn with_max_push_depth(mut self, depth: Option<usize>) -> Self {
        self.max_push_depth = depth;
        self
    }

    /// Resolve relations through the links of an OpenAPI description
    #[must_use]
    pub fn with_openapi_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.openapi_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_jsonld_context_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.jsonld_context_file = Some(path.into());
        self
    }

    /// Terminate TLS with a PEM certificate chain and private key
    #[must_use]
    pub fn with_tls(mut self, cert_file: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        self.cert_file = Some(cert_file.into());
        self.key_file = Some(key_file.into());
        self
    }

    #[must_use]
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }
}
