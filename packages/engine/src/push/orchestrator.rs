//! Push orchestration
//!
//! For every `preload` match, in match order: resolve the relation,
//! normalize it, derive downstream selectors, deduplicate, then push when the
//! connection and the budget allow it or announce it with a
//! `Link: <target>; rel=preload; as=fetch` header otherwise.
//!
//! Decisions are collected per match index and flushed in that order, so
//! `Link` headers always follow match order whatever the transport does
//! with the pushes it accepted.

use http::{HeaderMap, HeaderValue};
use serde_json::Value;

use super::context::PushContext;
use super::downstream::Downstream;
use super::pusher::Pusher;
use super::url::{Target, UrlNormalizer};
use crate::matcher::{MatchedNode, NodePath, TreeMatcher};
use crate::relation::{RelationResolver, Resolution, Route};
use crate::selector::SelectorSet;

/// Everything the orchestrator reads for one request
pub struct PreloadRequest<'a> {
    pub document: &'a Value,
    pub selectors: &'a SelectorSet,
    pub matcher: &'a TreeMatcher<'a>,
    pub resolver: &'a dyn RelationResolver,
    pub route: Route<'a>,
    pub urls: &'a UrlNormalizer,
    /// Headers every push promise starts from (forwarded host/proto, accept, ...)
    pub push_headers: &'a HeaderMap,
    /// 0 for the client request, parent depth + 1 for pushed sub-requests
    pub depth: usize,
}

/// Result of preload processing, in match order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadOutcome {
    /// Targets announced with a `Link` header
    pub links: Vec<String>,
    /// Targets promised to the client
    pub pushed: Vec<String>,
    /// Body values to replace with their query-carrying target
    pub rewrites: Vec<(NodePath, String)>,
}

impl PreloadOutcome {
    /// `Link` header values, in match order
    #[must_use]
    pub fn link_headers(&self) -> Vec<HeaderValue> {
        self.links
            .iter()
            .filter_map(|target| HeaderValue::from_str(&link_value(target)).ok())
            .collect()
    }

    /// Replace every rewritten relation in `document` with its new target
    ///
    /// A string node is replaced, an object node gets its `@id` replaced.
    pub fn apply_rewrites(&self, document: &mut Value) {
        for (path, target) in &self.rewrites {
            let Some(node) = document.pointer_mut(&path.to_pointer()) else {
                continue;
            };
            match node {
                Value::String(url) => *url = target.clone(),
                Value::Object(map) => {
                    map.insert("@id".to_string(), Value::String(target.clone()));
                }
                _ => {}
            }
        }
    }
}

enum Decision {
    Skip,
    Push(String),
    Link(String),
}

/// `Link` header value announcing a preloadable target
#[must_use]
pub fn link_value(target: &str) -> String {
    format!("<{target}>; rel=preload; as=fetch")
}

/// Run the push-or-link decision for every `preload` match of a request
pub fn preload(context: &PushContext, pusher: &dyn Pusher, request: &PreloadRequest<'_>) -> PreloadOutcome {
    let mut outcome = PreloadOutcome::default();
    if request.selectors.preload().is_empty() {
        return outcome;
    }

    let matches = request.matcher.find_all(request.document, request.selectors.preload());
    let decisions: Vec<Decision> = matches
        .iter()
        .map(|node| decide(context, pusher, request, node, &mut outcome.rewrites))
        .collect();

    for decision in decisions {
        match decision {
            Decision::Skip => {}
            Decision::Push(target) => outcome.pushed.push(target),
            Decision::Link(target) => outcome.links.push(target),
        }
    }

    tracing::debug!(
        path = request.route.path,
        depth = request.depth,
        matches = matches.len(),
        pushed = outcome.pushed.len(),
        links = outcome.links.len(),
        "preload processed"
    );

    outcome
}

fn decide(
    context: &PushContext,
    pusher: &dyn Pusher,
    request: &PreloadRequest<'_>,
    node: &MatchedNode<'_>,
    rewrites: &mut Vec<(NodePath, String)>,
) -> Decision {
    let stats = context.stats();

    let Resolution::Relation(relation) = request.resolver.resolve(node, request.document, &request.route) else {
        stats.record_not_relation();
        return Decision::Skip;
    };

    let Some(target) = request.urls.normalize(&relation) else {
        tracing::debug!(relation = %relation, "skipping relation that does not resolve to a URL");
        stats.record_not_relation();
        return Decision::Skip;
    };

    let downstream = Downstream::derive(request.matcher, request.selectors, &node.path);
    let with_query = downstream.apply_query(target.as_str(), request.selectors);
    let target = if with_query == target.as_str() {
        target
    } else {
        rewrites.push((node.path.clone(), with_query.clone()));
        target.with_str(with_query)
    };

    if !context.pushed().insert(target.as_str()) {
        stats.record_deduplicated();
        return Decision::Skip;
    }

    let path = match target {
        Target::Local(path) => path,
        Target::External(url) => {
            stats.record_link();
            return Decision::Link(url);
        }
    };

    if !(pusher.can_push() && context.allows_depth(request.depth) && context.budget().try_acquire()) {
        stats.record_link();
        return Decision::Link(path);
    }

    let mut headers = request.push_headers.clone();
    headers.extend(downstream.headers(request.selectors));

    match pusher.push(&path, headers) {
        Ok(()) => {
            stats.record_push();
            Decision::Push(path)
        }
        Err(e) => {
            tracing::debug!(push_target = %path, error = %e, "push failed, announcing with a Link header");
            stats.record_push_failure();
            stats.record_link();
            Decision::Link(path)
        }
    }
}
