//! Push-capability primitive
//!
//! The transport implements [`Pusher`]; the engine only decides what to
//! push. A successful `push` means the promise went out and the transport
//! took over fetching and delivering the resource.

use http::HeaderMap;

use crate::error::PushError;

/// Server push on the connection of the request being processed
pub trait Pusher: Send + Sync {
    /// Whether the connection can carry push promises at all
    fn can_push(&self) -> bool;

    /// Promise `path` with the synthesized sub-request `headers`
    fn push(&self, path: &str, headers: HeaderMap) -> Result<(), PushError>;
}

/// Transport without server push (HTTP/1.1); every relation becomes a `Link`
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPush;

impl Pusher for NoPush {
    #[inline]
    fn can_push(&self) -> bool {
        false
    }

    fn push(&self, _path: &str, _headers: HeaderMap) -> Result<(), PushError> {
        Err(PushError::Unsupported)
    }
}
