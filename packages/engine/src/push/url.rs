//! Relation URL normalization
//!
//! Relations are resolved against the URL of the request that produced the
//! document. Targets on the upstream's origin, or on the origin clients use
//! to reach the gateway, become client-facing `path?query` strings; anything
//! else stays absolute and can only be announced, never pushed.

use std::fmt;

use url::{Origin, Url};

use crate::error::{EngineError, EngineResult};

/// A normalized relation target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Path and query on the gateway's own origin; pushable
    Local(String),
    /// Absolute URL on another origin; `Link` only
    External(String),
}

impl Target {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Target::Local(path) | Target::External(path) => path,
        }
    }

    /// The same target with a different string, keeping locality
    #[must_use]
    pub fn with_str(&self, value: String) -> Target {
        match self {
            Target::Local(_) => Target::Local(value),
            Target::External(_) => Target::External(value),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps relation URLs to client-facing targets for one request
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    request: Url,
    upstream: Origin,
    public: Option<Origin>,
}

impl UrlNormalizer {
    /// Create a normalizer for a request on `upstream`
    ///
    /// `path_and_query` is the request target as received by the gateway.
    pub fn new(upstream: &Url, path_and_query: &str) -> EngineResult<Self> {
        let request = upstream
            .join(path_and_query)
            .map_err(|e| EngineError::invalid_url(path_and_query, e))?;

        Ok(Self {
            request,
            upstream: upstream.origin(),
            public: None,
        })
    }

    /// Also treat `scheme://host` (the client-facing origin) as local
    #[must_use]
    pub fn with_public_origin(mut self, scheme: &str, host: &str) -> Self {
        self.public = Url::parse(&format!("{scheme}://{host}/"))
            .ok()
            .map(|url| url.origin());
        self
    }

    /// Client-facing path of the request itself
    #[must_use]
    pub fn request_target(&self) -> String {
        path_and_query(&self.request)
    }

    /// Normalize one relation; `None` when it cannot be parsed
    #[must_use]
    pub fn normalize(&self, relation: &str) -> Option<Target> {
        let resolved = self.request.join(relation).ok()?;
        let origin = resolved.origin();

        if origin == self.upstream || self.public.as_ref() == Some(&origin) {
            Some(Target::Local(path_and_query(&resolved)))
        } else {
            Some(Target::External(resolved.to_string()))
        }
    }
}

fn path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    }
}
