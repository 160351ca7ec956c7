//! TLS termination
//!
//! Certificates and keys are PEM files. ALPN offers `h2` first so capable
//! clients get a pushable connection.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::ServerConfig;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::TlsAcceptor;

use crate::error::{GatewayError, GatewayResult};

/// ALPN identifier of HTTP/2 over TLS
pub const ALPN_H2: &[u8] = b"h2";
pub const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Build a TLS acceptor from a PEM certificate chain and private key
///
/// # Errors
///
/// Returns `GatewayError::Io` when a file cannot be read and
/// `GatewayError::Tls` when the material is empty or rejected by rustls.
pub fn acceptor(cert_file: &Path, key_file: &Path) -> GatewayResult<TlsAcceptor> {
    let certs = load_certs(cert_file)?;
    let key = load_key(key_file)?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(GatewayError::tls)?
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(GatewayError::tls)?;
    config.alpn_protocols = vec![ALPN_H2.to_vec(), ALPN_HTTP11.to_vec()];

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &Path) -> GatewayResult<Vec<CertificateDer<'static>>> {
    let mut reader = BufReader::new(File::open(path)?);
    let certs = rustls_pemfile::certs(&mut reader).collect::<Result<Vec<_>, _>>()?;

    if certs.is_empty() {
        return Err(GatewayError::Tls(format!("no certificate in {}", path.display())));
    }
    Ok(certs)
}

fn load_key(path: &Path) -> GatewayResult<PrivateKeyDer<'static>> {
    let mut reader = BufReader::new(File::open(path)?);
    rustls_pemfile::private_key(&mut reader)?
        .ok_or_else(|| GatewayError::Tls(format!("no private key in {}", path.display())))
}
