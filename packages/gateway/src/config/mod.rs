//! Gateway configuration
//!
//! The configuration is organized into logical modules:
//!
//! - `types`: the [`GatewayConfig`] struct and its fields
//! - `defaults`: default values and the `Default` implementation
//! - `builders`: fluent `with_*` methods
//! - `env`: loading from `PUSHGATE_*` environment variables
//! - `document`: loading the JSON-LD context or OpenAPI description
//! - `validation`: [`ConfigurationError`] and the [`Validator`] trait

pub mod builders;
pub mod defaults;
pub mod document;
pub mod env;
pub mod types;
pub mod validation;

pub use defaults::ConfigDefaults;
pub use types::GatewayConfig;
pub use validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
