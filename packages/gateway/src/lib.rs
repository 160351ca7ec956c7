//! # Pushgate
//!
//! HTTP/2 Server Push gateway for JSON and JSON-LD APIs.
//!
//! The gateway proxies an upstream API and honors two request inputs, each
//! accepted as a header or a query parameter:
//!
//! - `fields`: selectors pruning the response body
//! - `preload`: selectors naming related resources to deliver ahead of time,
//!   pushed over HTTP/2 or announced with `Link: rel=preload` headers
//!
//! The selector and push-decision engine lives in `pushgate_engine`; this
//! crate adds configuration, the upstream client, the request pipeline and
//! the HTTP/2 and HTTP/1.1 servers.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod server;
pub mod upstream;

pub use config::{ConfigurationError, GatewayConfig, Validator};
pub use error::{GatewayError, GatewayResult};
pub use pipeline::{Forwarded, IncomingRequest, Pipeline};
pub use server::Gateway;
