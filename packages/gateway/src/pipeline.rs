//! Request pipeline
//!
//! One pass per request, client or pushed: collect selectors, fetch the
//! upstream, run the push-or-link decisions, project the fields, and build
//! the response. Pushed sub-requests re-enter [`Pipeline::handle`] with the
//! [`PushContext`] of the client request that caused them, so nested
//! preloads share its budget and deduplication set.

use std::sync::Arc;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, Response, StatusCode, Uri};
use pushgate_engine::document;
use pushgate_engine::{
    DocumentMode, PreloadRequest, PushContext, PushStats, Pusher, Route, SelectorKind, SelectorSet,
    TreeMatcher, UrlNormalizer, preload, project_selectors,
};
use serde_json::Value;

use crate::config::{ConfigurationError, GatewayConfig};
use crate::error::GatewayResult;
use crate::upstream::Upstream;

/// Client headers copied onto every push promise
const PROPAGATED: [HeaderName; 5] = [
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::AUTHORIZATION,
    header::COOKIE,
    header::USER_AGENT,
];

/// Client-facing host and scheme of a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forwarded {
    pub host: String,
    pub proto: &'static str,
}

impl Forwarded {
    /// Host from the request authority, then `Host`, then `fallback_host`
    #[must_use]
    pub fn from_request(uri: &Uri, headers: &HeaderMap, proto: &'static str, fallback_host: &str) -> Self {
        let host = uri
            .authority()
            .map(|authority| authority.as_str().to_owned())
            .or_else(|| {
                headers
                    .get(header::HOST)
                    .and_then(|host| host.to_str().ok())
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| fallback_host.to_owned());

        Self { host, proto }
    }

    /// `scheme://host` as seen by the client
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.proto, self.host)
    }
}

/// A request as received by the gateway, body already buffered
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IncomingRequest {
    /// A pushed sub-request for `path` with the promised headers
    #[must_use]
    pub fn pushed(uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method: Method::GET,
            uri,
            headers,
            body: Bytes::new(),
        }
    }

    fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map_or_else(|| self.uri.path(), |path_and_query| path_and_query.as_str())
    }
}

/// Shared request processing state: upstream client, document mode, stats
#[derive(Debug)]
pub struct Pipeline {
    upstream: Upstream,
    mode: DocumentMode,
    stats: Arc<PushStats>,
    max_pushes: i64,
    max_push_depth: Option<usize>,
}

impl Pipeline {
    /// Build the pipeline for a validated configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingParameter` when no upstream is
    /// configured.
    pub fn new(config: &GatewayConfig, mode: DocumentMode, stats: Arc<PushStats>) -> GatewayResult<Self> {
        let base = config
            .upstream
            .clone()
            .ok_or_else(|| ConfigurationError::MissingParameter("upstream".to_string()))?;

        Ok(Self {
            upstream: Upstream::new(base, config.upstream_timeout),
            mode,
            stats,
            max_pushes: config.max_pushes,
            max_push_depth: config.max_push_depth,
        })
    }

    /// Fresh push state for one client request
    #[must_use]
    pub fn push_context(&self) -> Arc<PushContext> {
        Arc::new(PushContext::new(
            self.max_pushes,
            self.max_push_depth,
            Arc::clone(&self.stats),
        ))
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> &Arc<PushStats> {
        &self.stats
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> &DocumentMode {
        &self.mode
    }

    /// Process one request; never fails
    ///
    /// `depth` is 0 for a client request and the nesting level for pushed
    /// sub-requests.
    pub async fn handle(
        &self,
        request: IncomingRequest,
        forwarded: &Forwarded,
        context: &PushContext,
        pusher: &dyn Pusher,
        depth: usize,
    ) -> Response<Bytes> {
        let selectors = SelectorSet::from_request(&request.headers, request.uri.query());
        let target = request.path_and_query().to_owned();
        let path = request.uri.path().to_owned();

        let upstream_target = match request.uri.query().and_then(SelectorSet::strip_query) {
            Some(query) => format!("{path}?{query}"),
            None => path.clone(),
        };
        let mut upstream_headers = request.headers.clone();
        for kind in SelectorKind::ALL {
            upstream_headers.remove(kind.header_name());
        }
        if !selectors.is_empty() {
            // the body has to be decodable
            upstream_headers.remove(header::ACCEPT_ENCODING);
        }

        let response = match self
            .upstream
            .fetch(
                request.method.clone(),
                &upstream_target,
                &upstream_headers,
                forwarded,
                request.body.clone(),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(upstream_target = %upstream_target, error = %e, "upstream unavailable");
                return bad_gateway();
            }
        };

        if selectors.is_empty() || !is_processable(&response) {
            return response;
        }

        let mut body = match document::decode(response.body()) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(request_target = %target, error = %e, "passing through undecodable body");
                return response;
            }
        };

        let urls = match UrlNormalizer::new(self.upstream.base(), &target) {
            Ok(urls) => urls.with_public_origin(forwarded.proto, &forwarded.host),
            Err(e) => {
                tracing::debug!(request_target = %target, error = %e, "passing through unresolvable request URL");
                return response;
            }
        };

        self.stats.record_document();
        // the resource itself, as requested and as fetched without selectors
        context.pushed().insert(&urls.request_target());
        if let Some(own) = urls.normalize(&upstream_target) {
            context.pushed().insert(own.as_str());
        }

        let outcome = {
            let matcher = TreeMatcher::new(&self.mode, &body);
            let push_headers = push_headers(&request.headers);
            let preload_request = PreloadRequest {
                document: &body,
                selectors: &selectors,
                matcher: &matcher,
                resolver: &self.mode,
                route: Route::new(&request.method, &path),
                urls: &urls,
                push_headers: &push_headers,
                depth,
            };
            preload(context, pusher, &preload_request)
        };
        outcome.apply_rewrites(&mut body);

        let body = if selectors.fields().is_empty() {
            body
        } else {
            project_selectors(&body, &TreeMatcher::new(&self.mode, &body), selectors.fields())
        };

        rebuild(response, &body, outcome.link_headers())
    }
}

/// 2xx, JSON, not content-encoded
fn is_processable(response: &Response<Bytes>) -> bool {
    let json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(document::is_json);

    response.status().is_success() && json && !response.headers().contains_key(header::CONTENT_ENCODING)
}

fn push_headers(client: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for name in &PROPAGATED {
        for value in client.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// The upstream response with a new body and the `Link` headers appended
fn rebuild(upstream: Response<Bytes>, body: &Value, links: Vec<HeaderValue>) -> Response<Bytes> {
    let encoded = match document::encode(body) {
        Ok(encoded) => Bytes::from(encoded),
        Err(e) => {
            tracing::warn!(error = %e, "cannot re-encode document, passing through");
            return upstream;
        }
    };

    let (mut parts, _) = upstream.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    for link in links {
        parts.headers.append(header::LINK, link);
    }
    parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(encoded.len()));

    Response::from_parts(parts, encoded)
}

fn bad_gateway() -> Response<Bytes> {
    let mut response = Response::new(Bytes::new());
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
}
