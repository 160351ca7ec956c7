//! Reverse-proxy client for the upstream API
//!
//! Forwards the client request to the upstream origin over plain HTTP with
//! a pooled `hyper-util` client and buffers the whole response body, which
//! the pipeline needs in one piece to decode.

use std::time::Duration;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, Request, Response, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use url::Url;

use crate::error::{GatewayError, GatewayResult};
use crate::pipeline::Forwarded;

/// Connection-specific headers that never cross a proxy
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Pooled client bound to one upstream origin
#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Full<Bytes>>,
    base: Url,
    origin: String,
    timeout: Duration,
}

impl Upstream {
    #[must_use]
    pub fn new(base: Url, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        let origin = base.origin().ascii_serialization();

        Self {
            client,
            base,
            origin,
            timeout,
        }
    }

    /// Base URL relations are resolved against
    #[inline]
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Forward a request and buffer the upstream response
    ///
    /// Hop-by-hop headers are removed from the response, which can then be
    /// sent over either protocol.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Upstream` when the upstream cannot be reached
    /// or the response cannot be read, and `UpstreamTimeout` when the whole
    /// exchange exceeds the configured deadline.
    pub async fn fetch(
        &self,
        method: Method,
        path_and_query: &str,
        headers: &HeaderMap,
        forwarded: &Forwarded,
        body: Bytes,
    ) -> GatewayResult<Response<Bytes>> {
        let uri: Uri = format!("{}{path_and_query}", self.origin)
            .parse()
            .map_err(GatewayError::upstream)?;

        let mut request = Request::new(Full::new(body));
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.headers_mut() = forward_headers(headers, forwarded);

        let exchange = async {
            let response = self.client.request(request).await.map_err(GatewayError::upstream)?;
            let (mut parts, body) = response.into_parts();
            for name in &HOP_BY_HOP {
                parts.headers.remove(name);
            }
            let body = body.collect().await.map_err(GatewayError::upstream)?.to_bytes();
            Ok::<_, GatewayError>(Response::from_parts(parts, body))
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| GatewayError::UpstreamTimeout(self.timeout))?
    }
}

/// Client headers as sent upstream: no hop-by-hop headers, no `Host`, and
/// the client-facing host and scheme in `X-Forwarded-*`
fn forward_headers(headers: &HeaderMap, forwarded: &Forwarded) -> HeaderMap {
    let mut forwarded_headers = headers.clone();
    for name in HOP_BY_HOP.iter().chain([&header::HOST, &header::CONTENT_LENGTH]) {
        forwarded_headers.remove(name);
    }

    if let Ok(host) = HeaderValue::from_str(&forwarded.host) {
        forwarded_headers.insert(X_FORWARDED_HOST, host);
    }
    forwarded_headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static(forwarded.proto));

    forwarded_headers
}
