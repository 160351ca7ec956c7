//! Client-facing servers
//!
//! - `listener`: TCP accept loop, TLS termination and protocol dispatch
//! - `http2`: `h2` server whose streams can carry push promises
//! - `http1`: `hyper` HTTP/1.1 server, relations become `Link` headers
//! - `tls`: rustls server configuration from PEM files

pub mod http1;
pub mod http2;
pub mod listener;
pub mod tls;

pub use http2::H2Pusher;
pub use listener::Gateway;
