//! Default values for the gateway configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::types::GatewayConfig;

/// Common configuration defaults
pub struct ConfigDefaults;

impl ConfigDefaults {
    pub const ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);
    pub const MAX_PUSHES: i64 = -1;
    pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);
    pub const MAX_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(3600);
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            addr: ConfigDefaults::ADDR,
            upstream: None,
            max_pushes: ConfigDefaults::MAX_PUSHES,
            max_push_depth: None,
            openapi_file: None,
            jsonld_context_file: None,
            cert_file: None,
            key_file: None,
            upstream_timeout: ConfigDefaults::UPSTREAM_TIMEOUT,
        }
    }
}
