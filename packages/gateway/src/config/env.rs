//! Loading configuration from `PUSHGATE_*` environment variables

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use super::types::GatewayConfig;
use super::validation::{ConfigResult, ConfigurationError};

pub const ADDR: &str = "PUSHGATE_ADDR";
pub const UPSTREAM: &str = "PUSHGATE_UPSTREAM";
pub const MAX_PUSHES: &str = "PUSHGATE_MAX_PUSHES";
pub const MAX_PUSH_DEPTH: &str = "PUSHGATE_MAX_PUSH_DEPTH";
pub const OPENAPI: &str = "PUSHGATE_OPENAPI";
pub const JSONLD_CONTEXT: &str = "PUSHGATE_JSONLD_CONTEXT";
pub const CERT_FILE: &str = "PUSHGATE_CERT_FILE";
pub const KEY_FILE: &str = "PUSHGATE_KEY_FILE";
pub const UPSTREAM_TIMEOUT_MS: &str = "PUSHGATE_UPSTREAM_TIMEOUT_MS";

impl GatewayConfig {
    /// Read the configuration from the process environment
    ///
    /// Unset variables keep their default. The result is not validated.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` or `InvalidAddress`
    /// when a variable is set to a value that does not parse.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Same as [`GatewayConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|value| value.trim().to_owned()).filter(|value| !value.is_empty());
        let mut config = Self::default();

        if let Some(addr) = get(ADDR) {
            config.addr = addr
                .parse()
                .map_err(|_| ConfigurationError::InvalidAddress(format!("{ADDR}={addr}")))?;
        }
        if let Some(upstream) = get(UPSTREAM) {
            config.upstream = Some(
                Url::parse(&upstream)
                    .map_err(|e| ConfigurationError::InvalidAddress(format!("{UPSTREAM}={upstream}: {e}")))?,
            );
        }
        if let Some(max_pushes) = get(MAX_PUSHES) {
            config.max_pushes = parse_number(MAX_PUSHES, &max_pushes)?;
        }
        if let Some(depth) = get(MAX_PUSH_DEPTH) {
            config.max_push_depth = Some(parse_number(MAX_PUSH_DEPTH, &depth)?);
        }
        if let Some(timeout) = get(UPSTREAM_TIMEOUT_MS) {
            config.upstream_timeout = Duration::from_millis(parse_number(UPSTREAM_TIMEOUT_MS, &timeout)?);
        }

        config.openapi_file = get(OPENAPI).map(PathBuf::from);
        config.jsonld_context_file = get(JSONLD_CONTEXT).map(PathBuf::from);
        config.cert_file = get(CERT_FILE).map(PathBuf::from);
        config.key_file = get(KEY_FILE).map(PathBuf::from);

        Ok(config)
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigurationError::InvalidParameter(format!("{name} must be a number, got {value:?}")))
}
