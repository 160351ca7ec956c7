//! TCP listener and protocol dispatch
//!
//! Each accepted connection runs on its own task. With TLS the protocol is
//! whatever ALPN negotiated; in cleartext a connection opening with the
//! HTTP/2 preface is served as HTTP/2 with prior knowledge, anything else as
//! HTTP/1.1.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

use super::{http1, http2, tls};
use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use crate::pipeline::Pipeline;

/// Client connection preface of HTTP/2 (RFC 9113 section 3.4)
const PREFACE: &[u8] = b"PRI * HTTP/2.0\r\n\r\nSM\r\n\r\n";
const PREFACE_POLL: Duration = Duration::from_millis(5);
const PREFACE_DEADLINE: Duration = Duration::from_secs(10);

/// A bound gateway, ready to serve
pub struct Gateway {
    listener: TcpListener,
    pipeline: Arc<Pipeline>,
    tls: Option<TlsAcceptor>,
    local_host: Arc<str>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("local_host", &self.local_host)
            .field("tls", &self.tls.is_some())
            .finish()
    }
}

impl Gateway {
    /// Bind the configured address and prepare TLS when configured
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Io` when the address cannot be bound or a TLS
    /// file cannot be read, and `GatewayError::Tls` for unusable TLS material.
    pub async fn bind(config: &GatewayConfig, pipeline: Pipeline) -> GatewayResult<Self> {
        let tls = match (&config.cert_file, &config.key_file) {
            (Some(cert), Some(key)) => Some(tls::acceptor(cert, key)?),
            _ => None,
        };

        let listener = TcpListener::bind(config.addr).await?;
        let local_host: Arc<str> = Arc::from(listener.local_addr()?.to_string());

        tracing::info!(
            addr = %local_host,
            tls = tls.is_some(),
            mode = pipeline.mode().name(),
            max_pushes = config.max_pushes,
            "gateway listening"
        );

        Ok(Self {
            listener,
            pipeline: Arc::new(pipeline),
            tls,
            local_host,
        })
    }

    /// Address the listener is bound to
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Io` if the socket address cannot be read.
    pub fn local_addr(&self) -> GatewayResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    #[must_use]
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Io` if accepting connections fails.
    pub async fn run(self) -> GatewayResult<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` completes
    ///
    /// In-flight connections are not awaited.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Io` if accepting connections fails.
    pub async fn run_until<F>(self, shutdown: F) -> GatewayResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted?;
                    let pipeline = Arc::clone(&self.pipeline);
                    let tls = self.tls.clone();
                    let local_host = Arc::clone(&self.local_host);

                    tokio::spawn(async move {
                        if let Err(e) = dispatch(stream, pipeline, tls, local_host).await {
                            tracing::warn!(%peer, error = %e, "connection failed");
                        }
                    });
                }
            }
        }
    }
}

async fn dispatch(
    stream: TcpStream,
    pipeline: Arc<Pipeline>,
    tls: Option<TlsAcceptor>,
    local_host: Arc<str>,
) -> GatewayResult<()> {
    let _ = stream.set_nodelay(true);

    match tls {
        Some(acceptor) => {
            let stream = acceptor.accept(stream).await?;
            let negotiated_h2 = stream.get_ref().1.alpn_protocol() == Some(tls::ALPN_H2);
            if negotiated_h2 {
                http2::serve(stream, pipeline, "https", local_host).await
            } else {
                http1::serve(stream, pipeline, "https", local_host).await
            }
        }
        None => {
            if has_h2_preface(&stream).await? {
                http2::serve(stream, pipeline, "http", local_host).await
            } else {
                http1::serve(stream, pipeline, "http", local_host).await
            }
        }
    }
}

/// Whether a cleartext connection opens with the HTTP/2 preface
async fn has_h2_preface(stream: &TcpStream) -> std::io::Result<bool> {
    tokio::time::timeout(PREFACE_DEADLINE, peek_preface(stream))
        .await
        .unwrap_or(Ok(false))
}

async fn peek_preface(stream: &TcpStream) -> std::io::Result<bool> {
    let mut buffer = [0u8; PREFACE.len()];
    loop {
        let read = stream.peek(&mut buffer).await?;
        if read == 0 || buffer[..read] != PREFACE[..read] {
            return Ok(false);
        }
        if read == PREFACE.len() {
            return Ok(true);
        }
        tokio::time::sleep(PREFACE_POLL).await;
    }
}
