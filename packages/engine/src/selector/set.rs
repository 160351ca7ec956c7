//! Selector collection from a request
//!
//! `fields` and `preload` may arrive as request headers, as query-string
//! parameters, or both, each repeated any number of times. Everything is
//! gathered into one ordered value list per kind before parsing, so the rest
//! of the engine never sees the surface form except through
//! [`SelectorSource`].

use http::HeaderMap;

use super::parser::parse_values;
use super::types::{Selector, SelectorKind, SelectorSource};

/// The `fields` and `preload` selectors of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorSet {
    fields: Vec<Selector>,
    preload: Vec<Selector>,
    fields_source: SelectorSource,
    preload_source: SelectorSource,
}

impl SelectorSet {
    /// Create a set from already parsed selectors, as if sent through headers
    #[must_use]
    pub fn new(fields: Vec<Selector>, preload: Vec<Selector>) -> Self {
        let header = SelectorSource {
            header: true,
            query: false,
        };

        Self {
            fields_source: if fields.is_empty() { SelectorSource::default() } else { header },
            preload_source: if preload.is_empty() { SelectorSource::default() } else { header },
            fields,
            preload,
        }
    }

    /// Collect and parse both kinds from request headers and query string
    ///
    /// Header values come first, then query values. Header names are matched
    /// case-insensitively; non UTF-8 header values are ignored.
    #[must_use]
    pub fn from_request(headers: &HeaderMap, query: Option<&str>) -> Self {
        let mut set = Self::default();

        for kind in SelectorKind::ALL {
            let header_values: Vec<String> = headers
                .get_all(kind.header_name())
                .iter()
                .filter_map(|value| value.to_str().ok())
                .map(str::to_owned)
                .collect();

            let query_values: Vec<String> = query
                .map(|query| {
                    url::form_urlencoded::parse(query.as_bytes())
                        .filter(|(key, _)| key == kind.query_key())
                        .map(|(_, value)| value.into_owned())
                        .collect()
                })
                .unwrap_or_default();

            let source = SelectorSource {
                header: !header_values.is_empty(),
                query: !query_values.is_empty(),
            };
            let selectors = parse_values(header_values.iter().chain(query_values.iter()));

            match kind {
                SelectorKind::Fields => {
                    set.fields = selectors;
                    set.fields_source = source;
                }
                SelectorKind::Preload => {
                    set.preload = selectors;
                    set.preload_source = source;
                }
            }
        }

        set
    }

    /// Remove every `fields` / `preload` parameter from a query string
    ///
    /// Returns `None` when nothing else remains.
    #[must_use]
    pub fn strip_query(query: &str) -> Option<String> {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        let mut kept = 0usize;

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if SelectorKind::ALL.iter().any(|kind| key == kind.query_key()) {
                continue;
            }
            serializer.append_pair(&key, &value);
            kept += 1;
        }

        (kept > 0).then(|| serializer.finish())
    }

    /// Selectors of one kind
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
    pub fn fields(&self) -> &[Selector] {
        &self.fields
    }

    #[inline]
    #[must_use]
    pub fn preload(&self) -> &[Selector] {
        &self.preload
    }

    /// Surface form(s) one kind arrived through
    #[inline]
    #[must_use]
    pub fn source(&self, kind: SelectorKind) -> SelectorSource {
        match kind {
            SelectorKind::Fields => self.fields_source,
            SelectorKind::Preload => self.preload_source,
        }
    }

    /// True when the request asked for neither projection nor preloading
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.preload.is_empty()
    }
}
