//! HTTP/2 connections with server push
//!
//! Every client stream is handled on its own task. Its [`H2Pusher`] sends
//! PUSH_PROMISE frames on that stream and runs each promised request through
//! the pipeline on a spawned task. Pushed resources may push again: promises
//! always go out on the client stream, which stays open until every pushed
//! sub-request has finished.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::{Bytes, BytesMut};
use h2::server::{SendPushedResponse, SendResponse};
use h2::{RecvStream, SendStream};
use http::{HeaderMap, Method, Request, Response, Uri};
use parking_lot::Mutex;
use pushgate_engine::{PushContext, PushError, Pusher};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;

use crate::error::GatewayResult;
use crate::pipeline::{Forwarded, IncomingRequest, Pipeline};

/// Serve one HTTP/2 connection until the client closes it
pub(crate) async fn serve<T>(io: T, pipeline: Arc<Pipeline>, proto: &'static str, local_host: Arc<str>) -> GatewayResult<()>
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut connection = h2::server::handshake(io).await?;

    while let Some(accepted) = connection.accept().await {
        let (request, respond) = accepted?;
        let pipeline = Arc::clone(&pipeline);
        let local_host = Arc::clone(&local_host);

        tokio::spawn(async move {
            if let Err(e) = handle_stream(request, respond, pipeline, proto, &local_host).await {
                tracing::debug!(error = %e, "HTTP/2 stream ended with an error");
            }
        });
    }

    Ok(())
}

async fn handle_stream(
    request: Request<RecvStream>,
    respond: SendResponse<Bytes>,
    pipeline: Arc<Pipeline>,
    proto: &'static str,
    local_host: &str,
) -> GatewayResult<()> {
    let (parts, mut body) = request.into_parts();
    let body = read_body(&mut body).await?;

    let forwarded = Forwarded::from_request(&parts.uri, &parts.headers, proto, local_host);
    let request = IncomingRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };

    let context = pipeline.push_context();
    let pusher = H2Pusher::new(respond, Arc::clone(&pipeline), Arc::clone(&context), forwarded.clone());
    let response = pipeline.handle(request, &forwarded, &context, &pusher, 0).await;

    pusher.respond(response).await
}

async fn read_body(body: &mut RecvStream) -> Result<Bytes, h2::Error> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        // Returning the window keeps large uploads flowing
        let _ = body.flow_control().release_capacity(chunk.len());
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// State shared by a client stream and every sub-request pushed for it
struct Shared {
    /// The client stream; PUSH_PROMISE must be sent on a client-initiated stream
    stream: Mutex<SendResponse<Bytes>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    pipeline: Arc<Pipeline>,
    context: Arc<PushContext>,
    forwarded: Forwarded,
    refused: AtomicBool,
}

/// [`Pusher`] over one HTTP/2 client stream
#[derive(Clone)]
pub struct H2Pusher {
    shared: Arc<Shared>,
    depth: usize,
}

impl std::fmt::Debug for H2Pusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("H2Pusher")
            .field("forwarded", &self.shared.forwarded)
            .field("depth", &self.depth)
            .field("refused", &self.shared.refused.load(Ordering::Relaxed))
            .finish()
    }
}

impl H2Pusher {
    fn new(stream: SendResponse<Bytes>, pipeline: Arc<Pipeline>, context: Arc<PushContext>, forwarded: Forwarded) -> Self {
        Self {
            shared: Arc::new(Shared {
                stream: Mutex::new(stream),
                tasks: Mutex::new(Vec::new()),
                pipeline,
                context,
                forwarded,
                refused: AtomicBool::new(false),
            }),
            depth: 0,
        }
    }

    fn child(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            depth: self.depth + 1,
        }
    }

    /// Send the client stream's response, then end the stream once every
    /// pushed sub-request is done
    async fn respond(self, response: Response<Bytes>) -> GatewayResult<()> {
        let (parts, body) = response.into_parts();
        let mut stream = self
            .shared
            .stream
            .lock()
            .send_response(Response::from_parts(parts, ()), false)?;

        if !body.is_empty() {
            stream.send_data(body, false)?;
        }

        self.drain().await;
        stream.send_data(Bytes::new(), true)?;
        Ok(())
    }

    /// Wait for pushed sub-requests, including the ones they spawn meanwhile
    async fn drain(&self) {
        loop {
            let pending = std::mem::take(&mut *self.shared.tasks.lock());
            if pending.is_empty() {
                return;
            }
            for task in pending {
                if let Err(e) = task.await {
                    tracing::warn!(error = %e, "pushed sub-request task failed");
                }
            }
        }
    }

    /// Run a promised request through the pipeline and answer on the pushed stream
    async fn deliver(self, mut pushed: SendPushedResponse<Bytes>, uri: Uri, headers: HeaderMap) {
        let path = uri.to_string();
        let request = IncomingRequest::pushed(uri, headers);
        let shared = &self.shared;
        let response = shared
            .pipeline
            .handle(request, &shared.forwarded, &shared.context, &self, self.depth)
            .await;

        let (parts, body) = response.into_parts();
        let end_of_stream = body.is_empty();
        let sent = pushed
            .send_response(Response::from_parts(parts, ()), end_of_stream)
            .and_then(|mut stream: SendStream<Bytes>| {
                if end_of_stream {
                    Ok(())
                } else {
                    stream.send_data(body, true)
                }
            });

        if let Err(e) = sent {
            tracing::debug!(push_target = %path, error = %e, "pushed stream abandoned");
        }
    }
}

impl Pusher for H2Pusher {
    fn can_push(&self) -> bool {
        !self.shared.refused.load(Ordering::Acquire)
    }

    fn push(&self, path: &str, headers: HeaderMap) -> Result<(), PushError> {
        let target: Uri = path
            .parse()
            .map_err(|e: http::uri::InvalidUri| PushError::InvalidTarget(format!("{path}: {e}")))?;
        let uri: Uri = format!("{}{path}", self.shared.forwarded.origin())
            .parse()
            .map_err(|e: http::uri::InvalidUri| PushError::InvalidTarget(format!("{path}: {e}")))?;

        let mut promise = Request::new(());
        *promise.method_mut() = Method::GET;
        *promise.uri_mut() = uri;
        *promise.headers_mut() = headers.clone();

        let pushed = self.shared.stream.lock().push_request(promise);
        let pushed = match pushed {
            Ok(pushed) => pushed,
            Err(e) => {
                // Push disabled by the client, or the stream is gone
                self.shared.refused.store(true, Ordering::Release);
                return Err(PushError::Refused(e.to_string()));
            }
        };
        tracing::debug!(push_target = path, depth = self.depth + 1, "push promise sent");

        let task = tokio::spawn(self.child().deliver(pushed, target, headers));
        self.shared.tasks.lock().push(task);
        Ok(())
    }
}
