//! HTTP/1.1 connections
//!
//! HTTP/1.1 has no server push: every relation is announced with a `Link`
//! header through [`NoPush`].

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use pushgate_engine::NoPush;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::GatewayResult;
use crate::pipeline::{Forwarded, IncomingRequest, Pipeline};

/// Serve one HTTP/1.1 connection until the client closes it
pub(crate) async fn serve<T>(io: T, pipeline: Arc<Pipeline>, proto: &'static str, local_host: Arc<str>) -> GatewayResult<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |request: Request<Incoming>| {
        let pipeline = Arc::clone(&pipeline);
        let local_host = Arc::clone(&local_host);
        async move { Ok::<_, Infallible>(handle(request, &pipeline, proto, &local_host).await) }
    });

    http1::Builder::new()
        .keep_alive(true)
        .serve_connection(TokioIo::new(io), service)
        .await?;
    Ok(())
}

async fn handle(request: Request<Incoming>, pipeline: &Pipeline, proto: &'static str, local_host: &str) -> Response<Full<Bytes>> {
    let (parts, body) = request.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::debug!(error = %e, "cannot read request body");
            let mut response = Response::new(Full::new(Bytes::new()));
            *response.status_mut() = StatusCode::BAD_REQUEST;
            return response;
        }
    };

    let forwarded = Forwarded::from_request(&parts.uri, &parts.headers, proto, local_host);
    let request = IncomingRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };

    let context = pipeline.push_context();
    pipeline
        .handle(request, &forwarded, &context, &NoPush, 0)
        .await
        .map(Full::new)
}
