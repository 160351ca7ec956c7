//! Configuration validation
//!
//! Checks run once at startup, before anything binds or loads.

use std::time::Duration;

use super::defaults::ConfigDefaults;
use super::types::GatewayConfig;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid network address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing configuration parameter: {0}")]
    MissingParameter(String),

    #[error("Configuration conflict: {0}")]
    Conflict(String),
}

/// Configuration validation trait
pub trait Validator {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` variant if any validation fails:
    /// - `InvalidTimeout` - if the upstream timeout is zero or exceeds one hour
    /// - `InvalidAddress` - if the upstream is not a plain `http://` URL with a host
    /// - `InvalidParameter` - if the push ceiling is below `-1`
    /// - `MissingParameter` - if no upstream is configured
    /// - `Conflict` - if TLS material is half configured, or both document
    ///   modes are requested
    fn validate(&self) -> ConfigResult<()>;
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a timeout duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if the timeout is zero or
    /// longer than one hour.
    pub fn validate_timeout(timeout: Duration, name: &str) -> ConfigResult<()> {
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout(format!("{name} cannot be zero")));
        }

        if timeout > ConfigDefaults::MAX_UPSTREAM_TIMEOUT {
            return Err(ConfigurationError::InvalidTimeout(format!("{name} cannot exceed 1 hour")));
        }

        Ok(())
    }

    /// Validate that a value is at least `min`
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidParameter` when `value < min`.
    pub fn validate_minimum<T>(value: T, min: T, name: &str) -> ConfigResult<()>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min {
            return Err(ConfigurationError::InvalidParameter(format!(
                "{name} must be at least {min}, got {value}"
            )));
        }

        Ok(())
    }
}

impl Validator for GatewayConfig {
    fn validate(&self) -> ConfigResult<()> {
        let Some(upstream) = &self.upstream else {
            return Err(ConfigurationError::MissingParameter("upstream".to_string()));
        };

        if upstream.scheme() != "http" {
            return Err(ConfigurationError::InvalidAddress(format!(
                "upstream must be an http:// URL, got {upstream}"
            )));
        }
        if upstream.host_str().is_none() {
            return Err(ConfigurationError::InvalidAddress(format!("upstream {upstream} has no host")));
        }

        ConfigValidator::validate_minimum(self.max_pushes, -1, "max_pushes")?;
        ConfigValidator::validate_timeout(self.upstream_timeout, "upstream_timeout")?;

        if self.cert_file.is_some() != self.key_file.is_some() {
            return Err(ConfigurationError::Conflict(
                "cert_file and key_file must be set together".to_string(),
            ));
        }

        if self.openapi_file.is_some() && self.jsonld_context_file.is_some() {
            return Err(ConfigurationError::Conflict(
                "openapi_file and jsonld_context_file select different document modes".to_string(),
            ));
        }

        Ok(())
    }
}
