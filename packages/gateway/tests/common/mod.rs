//! In-process upstream API and gateway for end-to-end tests

#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode, header};
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use pushgate::{Gateway, GatewayConfig, Pipeline};
use pushgate_engine::{DocumentMode, PushStats};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

const JSONLD: &str = "application/ld+json";

/// Fixture documents served by the upstream, keyed by path
fn document(path: &str) -> Option<&'static str> {
    let body = match path {
        "/books.jsonld" => r#"{"@id":"/books.jsonld","@type":"hydra:Collection","hydra:member":["/books/1.jsonld","/books/2.jsonld"]}"#,
        "/books/1.jsonld" => r#"{"@id":"/books/1.jsonld","@type":"Book","title":"Book 1","related":"/books/99.jsonld","author":"/authors/1.jsonld"}"#,
        "/books/2.jsonld" => r#"{"@id":"/books/2.jsonld","@type":"Book","title":"Book 2","related":"/books/1.jsonld","author":"/authors/1.jsonld"}"#,
        "/books/3.jsonld" => r#"{"author":"/authors/1.jsonld","related":"/books/99.jsonld"}"#,
        "/books/99.jsonld" => r#"{"@id":"/books/99.jsonld","@type":"Book","title":"Book 99","author":"/authors/2.jsonld"}"#,
        "/authors/1.jsonld" => r#"{"@id":"/authors/1.jsonld","@type":"Author","name":"Author 1"}"#,
        "/authors/2.jsonld" => r#"{"@id":"/authors/2.jsonld","@type":"Author","name":"Author 2"}"#,
        _ => return None,
    };
    Some(body)
}

/// OpenAPI description of the `/api` routes
pub const OPENAPI: &str = r#"
openapi: 3.0.0
info:
  title: Library
  version: 1.0.0
servers:
  - url: /api
paths:
  /books:
    get:
      operationId: getBooks
      responses:
        '200':
          description: Books
          links:
            author:
              operationId: getAuthor
              parameters:
                id: '$response.body#/member/*/author'
  /books/{id}:
    get:
      operationId: getBook
      responses:
        '200':
          description: Book
          links:
            author:
              operationId: getAuthor
              parameters:
                id: '$response.body#/author'
  /authors/{id}:
    get:
      operationId: getAuthor
      responses:
        '200':
          description: Author
"#;

/// Plain JSON documents described by [`OPENAPI`]
fn api_document(path: &str) -> Option<&'static str> {
    let body = match path {
        "/api/books" => r#"{"member":[{"id":1,"author":1},{"id":2,"author":2}]}"#,
        "/api/books/1" => r#"{"id":1,"title":"Book 1","author":1}"#,
        "/api/authors/1" => r#"{"id":1,"name":"Author 1"}"#,
        "/api/authors/2" => r#"{"id":2,"name":"Author 2"}"#,
        _ => return None,
    };
    Some(body)
}

async fn respond(request: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = request.uri().path().to_owned();

    let response = match path.as_str() {
        "/forwarded" => {
            let header_value = |name: &str| {
                request
                    .headers()
                    .get(name)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_owned()
            };
            let body = format!(
                "X-Forwarded-Host: {}\nX-Forwarded-Proto: {}",
                header_value("x-forwarded-host"),
                header_value("x-forwarded-proto")
            );
            text(StatusCode::OK, body)
        }
        "/echo-query" => {
            let query = request.uri().query().unwrap_or_default().to_owned();
            let selectors = request.headers().contains_key("preload") || request.headers().contains_key("fields");
            let body = format!(r#"{{"query":"{query}","selectors":{selectors}}}"#);
            json(StatusCode::OK, body)
        }
        "/plain" => text(StatusCode::OK, "/authors/1.jsonld".to_string()),
        "/broken" => json(StatusCode::OK, "{not json".to_string()),
        "/error" => json(StatusCode::INTERNAL_SERVER_ERROR, r#"{"author":"/authors/1.jsonld"}"#.to_string()),
        _ if path.starts_with("/api/") => match api_document(&path) {
            Some(body) => with_type(StatusCode::OK, "application/json", body.to_string()),
            None => json(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#.to_string()),
        },
        _ => match document(&path) {
            Some(body) => json(StatusCode::OK, body.to_string()),
            None => json(StatusCode::NOT_FOUND, r#"{"error":"not found"}"#.to_string()),
        },
    };

    Ok(response)
}

fn json(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    with_type(status, JSONLD, body)
}

fn text(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    with_type(status, "text/plain", body)
}

fn with_type(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, header::HeaderValue::from_static(content_type));
    response
}

/// Start the fixture upstream on an ephemeral port
pub async fn spawn_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream listener");
    let addr = listener.local_addr().expect("Failed to read upstream address");

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service_fn(respond))
                    .await;
            });
        }
    });

    addr
}

/// A running gateway in front of a fresh fixture upstream
pub struct TestGateway {
    pub addr: SocketAddr,
    pub upstream: SocketAddr,
    pub stats: Arc<PushStats>,
}

pub async fn spawn_gateway(configure: impl FnOnce(GatewayConfig) -> GatewayConfig) -> TestGateway {
    spawn_gateway_with_mode(DocumentMode::default(), configure).await
}

/// A running gateway resolving relations with `mode`
pub async fn spawn_gateway_with_mode(
    mode: DocumentMode,
    configure: impl FnOnce(GatewayConfig) -> GatewayConfig,
) -> TestGateway {
    let upstream = spawn_upstream().await;
    let upstream_url = Url::parse(&format!("http://{upstream}")).expect("Failed to parse upstream URL");

    let config = configure(
        GatewayConfig::new(upstream_url).with_addr("127.0.0.1:0".parse().expect("Failed to parse address")),
    );
    let stats = Arc::new(PushStats::default());
    let pipeline =
        Pipeline::new(&config, mode, Arc::clone(&stats)).expect("Failed to build pipeline");
    let gateway = Gateway::bind(&config, pipeline).await.expect("Failed to bind gateway");
    let addr = gateway.local_addr().expect("Failed to read gateway address");

    tokio::spawn(gateway.run_until(std::future::pending()));

    TestGateway { addr, upstream, stats }
}

/// A buffered response as seen by the test client
#[derive(Debug)]
pub struct Fetched {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Bytes,
}

impl Fetched {
    pub fn links(&self) -> Vec<String> {
        self.headers
            .get_all(header::LINK)
            .iter()
            .map(|value| value.to_str().expect("Failed to read Link header").to_owned())
            .collect()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("Failed to decode body")
    }
}

/// GET over HTTP/1.1
pub async fn get_http1(addr: SocketAddr, target: &str, headers: &[(&'static str, &'static str)]) -> Fetched {
    let stream = TcpStream::connect(addr).await.expect("Failed to connect to gateway");
    let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .expect("Failed to complete HTTP/1 handshake");
    tokio::spawn(connection);

    let mut builder = Request::builder().uri(target).header(header::HOST, addr.to_string());
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(Empty::<Bytes>::new()).expect("Failed to build request");

    let response = sender.send_request(request).await.expect("Failed to send request");
    let (parts, body) = response.into_parts();
    let body = body.collect().await.expect("Failed to read body").to_bytes();

    Fetched {
        status: parts.status,
        headers: parts.headers,
        body,
    }
}

/// A pushed resource: promised path and its response
#[derive(Debug)]
pub struct Pushed {
    pub path: String,
    pub response: Fetched,
}

/// GET over cleartext HTTP/2, collecting the primary response and every push
pub async fn get_h2(addr: SocketAddr, target: &str, headers: &[(&'static str, &'static str)]) -> (Fetched, Vec<Pushed>) {
    let stream = TcpStream::connect(addr).await.expect("Failed to connect to gateway");
    let (client, connection) = h2::client::handshake(stream)
        .await
        .expect("Failed to complete HTTP/2 handshake");
    tokio::spawn(connection);

    let mut client = client.ready().await.expect("Failed to get HTTP/2 client ready");
    let mut builder = Request::builder().uri(format!("http://{addr}{target}"));
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = builder.body(()).expect("Failed to build request");

    let (mut response, _) = client.send_request(request, true).expect("Failed to send request");
    let mut promises = response.push_promises();

    let response = response.await.expect("Failed to receive response");
    let (parts, body) = response.into_parts();
    let primary = Fetched {
        status: parts.status,
        headers: parts.headers,
        body: read_h2_body(body).await,
    };

    let mut pushed = Vec::new();
    while let Some(promise) = promises.push_promise().await {
        let promise = promise.expect("Failed to receive push promise");
        let (request, response) = promise.into_parts();
        let path = request
            .uri()
            .path_and_query()
            .map(ToString::to_string)
            .unwrap_or_default();

        let response = response.await.expect("Failed to receive pushed response");
        let (parts, body) = response.into_parts();
        pushed.push(Pushed {
            path,
            response: Fetched {
                status: parts.status,
                headers: parts.headers,
                body: read_h2_body(body).await,
            },
        });
    }

    (primary, pushed)
}

async fn read_h2_body(mut body: h2::RecvStream) -> Bytes {
    let mut buffer = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.expect("Failed to read HTTP/2 data");
        let _ = body.flow_control().release_capacity(chunk.len());
        buffer.extend_from_slice(&chunk);
    }
    Bytes::from(buffer)
}

/// Parse a body and assert it is JSON
pub fn json_body(fetched: &Fetched) -> serde_json::Value {
    serde_json::from_slice(&fetched.body).expect("Failed to parse JSON body")
}
