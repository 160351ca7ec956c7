//! Selectors forwarded to a related resource
//!
//! A selector that passes through a relation's path continues inside the
//! related resource: `/hydra:member/*/author` matched at `hydra:member/0`
//! forwards `/author` to the member. Each kind travels the way the client
//! sent it: as query parameters appended to the target (the body then links
//! to that same URL), or as request headers of the push promise.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::matcher::{NodePath, TreeMatcher};
use crate::selector::{Selector, SelectorKind, SelectorSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Downstream {
    pub fields: Vec<Selector>,
    pub preload: Vec<Selector>,
}

impl Downstream {
    /// Derive the selectors continuing below `path`
    #[must_use]
    pub fn derive(matcher: &TreeMatcher<'_>, selectors: &SelectorSet, path: &NodePath) -> Self {
        let below = |kind: SelectorKind| {
            let mut remainders: Vec<Selector> = Vec::new();
            for selector in selectors.selectors(kind) {
                if let Some(rest) = matcher.remainder(selector, path)
                    && !remainders.contains(&rest)
                {
                    remainders.push(rest);
                }
            }
            remainders
        };

        Self {
            fields: below(SelectorKind::Fields),
            preload: below(SelectorKind::Preload),
        }
    }

    #[inline]
    #[must_use]
    pub fn selectors(&self, kind: SelectorKind) -> &[Selector] {
        match kind {
            SelectorKind::Fields => &self.fields,
            SelectorKind::Preload => &self.preload,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.preload.is_empty()
    }

    /// Append the query-form kinds to `target` as `fields=` / `preload=` parameters
    #[must_use]
    pub fn apply_query(&self, target: &str, selectors: &SelectorSet) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let mut appended = false;

        for kind in SelectorKind::ALL {
            if !selectors.source(kind).prefers_query() {
                continue;
            }
            for selector in self.selectors(kind) {
                serializer.append_pair(kind.query_key(), selector.as_str());
                appended = true;
            }
        }

        if !appended {
            return target.to_owned();
        }

        let separator = if target.contains('?') { '&' } else { '?' };
        format!("{target}{separator}{}", serializer.finish())
    }

    /// Header-form kinds as `Fields` / `Preload` request headers
    #[must_use]
    pub fn headers(&self, selectors: &SelectorSet) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for kind in SelectorKind::ALL {
            let forwarded = self.selectors(kind);
            if forwarded.is_empty() || selectors.source(kind).prefers_query() {
                continue;
            }

            let joined = forwarded.iter().map(Selector::as_str).collect::<Vec<_>>().join(",");
            match HeaderValue::from_str(&joined) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(kind.header_name()), value);
                }
                Err(e) => tracing::debug!(selectors = %joined, error = %e, "cannot forward selectors as a header"),
            }
        }

        headers
    }
}
