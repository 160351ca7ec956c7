//! Push-or-link decision tests with a recording transport

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use http::{HeaderMap, HeaderValue, Method};
use pushgate_engine::prelude::*;
use serde_json::{Value, json};
use url::Url;

/// Transport double recording every promise it accepts
#[derive(Default)]
struct RecordingPusher {
    disabled: bool,
    refuse: bool,
    promises: Mutex<Vec<(String, HeaderMap)>>,
}

impl RecordingPusher {
    fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    fn paths(&self) -> Vec<String> {
        self.promises
            .lock()
            .expect("Failed to lock promises")
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    fn headers(&self, index: usize) -> HeaderMap {
        self.promises.lock().expect("Failed to lock promises")[index].1.clone()
    }
}

impl Pusher for RecordingPusher {
    fn can_push(&self) -> bool {
        !self.disabled
    }

    fn push(&self, path: &str, headers: HeaderMap) -> Result<(), PushError> {
        if self.refuse {
            return Err(PushError::Refused("stream limit reached".to_string()));
        }
        self.promises
            .lock()
            .expect("Failed to lock promises")
            .push((path.to_string(), headers));
        Ok(())
    }
}

struct Fixture {
    mode: DocumentMode,
    upstream: Url,
    push_headers: HeaderMap,
}

impl Fixture {
    fn new() -> Self {
        let mut push_headers = HeaderMap::new();
        push_headers.insert("accept", HeaderValue::from_static("application/ld+json"));

        Self {
            mode: DocumentMode::default(),
            upstream: Url::parse("http://upstream.test/").expect("Failed to parse upstream URL"),
            push_headers,
        }
    }

    fn run(&self, context: &PushContext, pusher: &dyn Pusher, document: &Value, selectors: &SelectorSet, target: &str) -> PreloadOutcome {
        self.run_at_depth(context, pusher, document, selectors, target, 0)
    }

    fn run_at_depth(
        &self,
        context: &PushContext,
        pusher: &dyn Pusher,
        document: &Value,
        selectors: &SelectorSet,
        target: &str,
        depth: usize,
    ) -> PreloadOutcome {
        let matcher = TreeMatcher::new(&self.mode, document);
        let urls = UrlNormalizer::new(&self.upstream, target).expect("Failed to build URL normalizer");
        let method = Method::GET;
        let path = target.split('?').next().unwrap_or(target);

        let request = PreloadRequest {
            document,
            selectors,
            matcher: &matcher,
            resolver: &self.mode,
            route: Route::new(&method, path),
            urls: &urls,
            push_headers: &self.push_headers,
            depth,
        };
        preload(context, pusher, &request)
    }
}

fn header_selectors(preload: &[&str]) -> SelectorSet {
    SelectorSet::new(Vec::new(), parse_values(preload.iter().copied()))
}

fn collection() -> Value {
    json!({
        "@id": "/books",
        "hydra:member": [
            {"@id": "/books/1", "author": "/authors/1"},
            {"@id": "/books/2", "author": "/authors/2"},
            {"@id": "/books/3", "author": "/authors/3"}
        ]
    })
}

fn context_with(max_pushes: i64) -> (PushContext, Arc<PushStats>) {
    let stats = Arc::new(PushStats::default());
    (PushContext::new(max_pushes, None, Arc::clone(&stats)), stats)
}

#[test]
fn test_pushes_every_relation_in_match_order() {
    let fixture = Fixture::new();
    let (context, stats) = context_with(-1);
    let pusher = RecordingPusher::default();

    let outcome = fixture.run(&context, &pusher, &collection(), &header_selectors(&["/hydra:member/*/author"]), "/books");

    assert_eq!(outcome.pushed, vec!["/authors/1", "/authors/2", "/authors/3"]);
    assert!(outcome.links.is_empty());
    assert_eq!(pusher.paths(), outcome.pushed);
    assert_eq!(stats.snapshot().pushes, 3);

    // Push promises start from the base headers
    assert_eq!(pusher.headers(0).get("accept"), Some(&HeaderValue::from_static("application/ld+json")));
}

#[test]
fn test_budget_exhaustion_falls_back_to_links() {
    let fixture = Fixture::new();
    let (context, stats) = context_with(2);
    let pusher = RecordingPusher::default();

    let outcome = fixture.run(&context, &pusher, &collection(), &header_selectors(&["/hydra:member/*/author"]), "/books");

    assert_eq!(outcome.pushed, vec!["/authors/1", "/authors/2"]);
    assert_eq!(outcome.links, vec!["/authors/3"]);
    assert_eq!(
        outcome.link_headers(),
        vec![HeaderValue::from_static("</authors/3>; rel=preload; as=fetch")]
    );
    assert_eq!(stats.snapshot().links, 1);
}

#[test]
fn test_push_and_link_cover_the_same_targets() {
    let fixture = Fixture::new();
    let selectors = header_selectors(&["/hydra:member/*/author", "/hydra:member/*"]);

    let pushing = RecordingPusher::default();
    let pushed = fixture.run(&PushContext::unlimited(), &pushing, &collection(), &selectors, "/books");

    let linked = fixture.run(&PushContext::unlimited(), &NoPush, &collection(), &selectors, "/books");

    let pushed_targets: BTreeSet<String> = pushed.pushed.into_iter().chain(pushed.links).collect();
    let linked_targets: BTreeSet<String> = linked.links.iter().cloned().collect();

    assert!(linked.pushed.is_empty());
    assert_eq!(pushed_targets, linked_targets);
    assert_eq!(linked_targets.len(), 6);
}

#[test]
fn test_duplicate_relations_are_announced_once() {
    let fixture = Fixture::new();
    let (context, stats) = context_with(-1);
    let pusher = RecordingPusher::default();
    let document = json!({
        "hydra:member": [
            {"author": "/authors/1"},
            {"author": "/authors/1"},
            {"author": "/books"}
        ]
    });

    let outcome = fixture.run(&context, &pusher, &document, &header_selectors(&["/hydra:member/*/author"]), "/books");

    assert_eq!(outcome.pushed, vec!["/authors/1", "/books"]);
    assert_eq!(stats.snapshot().deduplicated, 1);
}

#[test]
fn test_request_target_is_never_pushed_back() {
    let fixture = Fixture::new();
    let (context, _) = context_with(-1);
    context.pushed().insert("/books");
    let pusher = RecordingPusher::default();

    let outcome = fixture.run(&context, &pusher, &collection(), &header_selectors(&["/@id"]), "/books");

    assert!(outcome.pushed.is_empty());
    assert!(outcome.links.is_empty());
}

#[test]
fn test_nested_preload_in_query_form_rewrites_body() {
    let fixture = Fixture::new();
    let (context, _) = context_with(-1);
    let pusher = RecordingPusher::default();
    let mut document = json!({"hydra:member": ["/books/1.jsonld", "/books/2.jsonld"]});
    let selectors = SelectorSet::from_request(&HeaderMap::new(), Some("preload=/hydra:member/*/author"));

    let outcome = fixture.run(&context, &pusher, &document, &selectors, "/books.jsonld?preload=/hydra:member/*/author");
    outcome.apply_rewrites(&mut document);

    assert_eq!(
        outcome.pushed,
        vec!["/books/1.jsonld?preload=%2Fauthor", "/books/2.jsonld?preload=%2Fauthor"]
    );
    assert_eq!(
        document,
        json!({"hydra:member": ["/books/1.jsonld?preload=%2Fauthor", "/books/2.jsonld?preload=%2Fauthor"]})
    );
    assert!(pusher.headers(0).get("preload").is_none());
}

#[test]
fn test_nested_preload_in_header_form_travels_as_push_header() {
    let fixture = Fixture::new();
    let (context, _) = context_with(-1);
    let pusher = RecordingPusher::default();
    let document = json!({"hydra:member": ["/books/1.jsonld"]});
    let selectors = SelectorSet::new(
        parse_values(["/hydra:member/*/title"]),
        parse_values(["/hydra:member/*/author"]),
    );

    let outcome = fixture.run(&context, &pusher, &document, &selectors, "/books.jsonld");

    assert_eq!(outcome.pushed, vec!["/books/1.jsonld"]);
    assert!(outcome.rewrites.is_empty());

    let headers = pusher.headers(0);
    assert_eq!(headers.get("preload"), Some(&HeaderValue::from_static("/author")));
    assert_eq!(headers.get("fields"), Some(&HeaderValue::from_static("/title")));
}

#[test]
fn test_refused_push_becomes_link() {
    let fixture = Fixture::new();
    let (context, stats) = context_with(-1);
    let pusher = RecordingPusher::refusing();

    let outcome = fixture.run(&context, &pusher, &collection(), &header_selectors(&["/hydra:member/0/author"]), "/books");

    assert!(outcome.pushed.is_empty());
    assert_eq!(outcome.links, vec!["/authors/1"]);
    assert_eq!(stats.snapshot().push_failures, 1);
}

#[test]
fn test_disabled_pusher_links_everything() {
    let fixture = Fixture::new();
    let pusher = RecordingPusher {
        disabled: true,
        ..RecordingPusher::default()
    };

    let outcome = fixture.run(&PushContext::unlimited(), &pusher, &collection(), &header_selectors(&["/hydra:member/*/author"]), "/books");

    assert_eq!(outcome.links.len(), 3);
    assert!(pusher.paths().is_empty());
}

#[test]
fn test_external_relations_are_only_linked() {
    let fixture = Fixture::new();
    let pusher = RecordingPusher::default();
    let document = json!({"cover": "https://cdn.example/covers/1.png", "author": "http://upstream.test/authors/1"});

    let outcome = fixture.run(&PushContext::unlimited(), &pusher, &document, &header_selectors(&["/cover", "/author"]), "/books/1");

    assert_eq!(outcome.links, vec!["https://cdn.example/covers/1.png"]);
    assert_eq!(outcome.pushed, vec!["/authors/1"]);
}

#[test]
fn test_relative_relations_resolve_against_request() {
    let fixture = Fixture::new();
    let document = json!({"next": "?page=2", "author": "../authors/1"});

    let outcome = fixture.run(&PushContext::unlimited(), &NoPush, &document, &header_selectors(&["/next", "/author"]), "/books/1?page=1");

    assert_eq!(outcome.links, vec!["/books/1?page=2", "/authors/1"]);
}

#[test]
fn test_non_relations_are_skipped() {
    let fixture = Fixture::new();
    let (context, stats) = context_with(-1);
    let document = json!({"author": {"name": "Anonymous"}, "pages": 1488});

    let outcome = fixture.run(&context, &NoPush, &document, &header_selectors(&["/author", "/pages", "/missing"]), "/books/1");

    assert!(outcome.links.is_empty());
    assert_eq!(stats.snapshot().not_relations, 2);
}

#[test]
fn test_depth_limit_turns_pushes_into_links() {
    let fixture = Fixture::new();
    let context = PushContext::new(-1, Some(1), Arc::new(PushStats::default()));
    let pusher = RecordingPusher::default();

    let outcome = fixture.run_at_depth(&context, &pusher, &collection(), &header_selectors(&["/hydra:member/0/author"]), "/books", 1);

    assert_eq!(outcome.links, vec!["/authors/1"]);
    assert!(pusher.paths().is_empty());
}

#[test]
fn test_no_preload_selectors_is_a_no_op() {
    let fixture = Fixture::new();
    let pusher = RecordingPusher::default();
    let selectors = SelectorSet::new(parse_values(["/title"]), Vec::new());

    let outcome = fixture.run(&PushContext::unlimited(), &pusher, &collection(), &selectors, "/books");

    assert_eq!(outcome, PreloadOutcome::default());
}
