//! Tree matcher tests

use pushgate_engine::prelude::*;
use serde_json::json;

fn selector(raw: &str) -> Selector {
    parse_selector(raw).expect("Failed to parse selector")
}

fn rendered(nodes: &[MatchedNode<'_>]) -> Vec<String> {
    nodes.iter().map(|node| node.path.to_string()).collect()
}

#[test]
fn test_wildcard_fans_out_over_array() {
    let document = json!({
        "hydra:member": [
            {"author": "/authors/1"},
            {"author": "/authors/2"},
            {"title": "no author"}
        ]
    });

    let nodes = TreeMatcher::literal().find(&document, &selector("/hydra:member/*/author"), 0);

    assert_eq!(rendered(&nodes), vec!["hydra:member/0/author", "hydra:member/1/author"]);
    assert_eq!(nodes[1].value, &json!("/authors/2"));
}

#[test]
fn test_wildcard_over_object_keeps_document_order() {
    let document = json!({"z": 1, "a": 2, "m": 3});
    let nodes = TreeMatcher::literal().find(&document, &selector("/*"), 0);

    assert_eq!(rendered(&nodes), vec!["z", "a", "m"]);
}

#[test]
fn test_numeric_literal_selects_array_index() {
    let document = json!({"items": ["a", "b", "c"]});
    let nodes = TreeMatcher::literal().find(&document, &selector("/items/1"), 0);

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].value, &json!("b"));
    assert_eq!(nodes[0].path.segments()[1], PathSegment::Index(1));
}

#[test]
fn test_misses_are_pruned_silently() {
    let document = json!({"flag": true, "nothing": null, "items": []});
    let matcher = TreeMatcher::literal();

    assert!(matcher.find(&document, &selector("/missing"), 0).is_empty());
    assert!(matcher.find(&document, &selector("/flag/x"), 0).is_empty());
    assert!(matcher.find(&document, &selector("/nothing/x"), 0).is_empty());
    assert!(matcher.find(&document, &selector("/items/*"), 0).is_empty());
}

#[test]
fn test_string_with_segments_left_is_a_link_boundary() {
    let document = json!({"hydra:member": [{"author": "/authors/1"}]});
    let nodes = TreeMatcher::literal().find(&document, &selector("/hydra:member/*/author/name"), 0);

    assert_eq!(rendered(&nodes), vec!["hydra:member/0/author"]);
    assert_eq!(nodes[0].consumed(), 3);
}

#[test]
fn test_selector_ending_on_container_yields_it() {
    let document = json!({"author": {"@id": "/authors/1", "name": "Kévin"}});
    let nodes = TreeMatcher::literal().find(&document, &selector("/author"), 0);

    assert_eq!(nodes.len(), 1);
    assert!(nodes[0].value.is_object());
}

#[test]
fn test_union_keeps_first_seen_order_without_duplicates() {
    let document = json!({"a": 1, "b": 2, "c": 3});
    let selectors = vec![selector("/b"), selector("/*")];

    let set = TreeMatcher::literal().find_all(&document, &selectors);
    let paths: Vec<String> = set.paths().map(ToString::to_string).collect();

    assert_eq!(paths, vec!["b", "a", "c"]);
    // "b" is owned by the first selector that reached it
    assert_eq!(set.iter().next().map(|node| node.selector), Some(0));
    assert!(set.contains(&NodePath::root().child_key("c")));
    assert!(!set.contains(&NodePath::root().child_key("d")));
}

#[test]
fn test_jsonld_alias_matches_expanded_key() {
    let context = JsonLdContext::new().define("schema", "http://schema.org/");
    let mode = DocumentMode::JsonLd(context);
    let document = json!({
        "@context": {"name": "http://schema.org/name"},
        "name": "Les Misérables"
    });

    let matcher = TreeMatcher::new(&mode, &document);
    let nodes = matcher.find(&document, &selector("/schema:name"), 0);

    assert_eq!(rendered(&nodes), vec!["name"]);
    assert!(matcher.key_matches("schema:name", "name"));
    assert!(!TreeMatcher::literal().key_matches("schema:name", "name"));
}

#[test]
fn test_remainder_of_selector_passing_through_path() {
    let document = json!({"hydra:member": [{"author": "/authors/1"}]});
    let matcher = TreeMatcher::literal();
    let nodes = matcher.find(&document, &selector("/hydra:member/*/author"), 0);
    let path = &nodes[0].path;

    let rest = matcher.remainder(&selector("/hydra:member/*/author/name"), path);
    assert_eq!(rest.map(|rest| rest.to_string()), Some("/name".to_string()));

    assert!(matcher.remainder(&selector("/hydra:member/*/author"), path).is_none());
    assert!(matcher.remainder(&selector("/hydra:member/3/author/name"), path).is_none());
    assert!(matcher.remainder(&selector("/other/*/author/name"), path).is_none());
}

#[test]
fn test_node_path_pointer_escapes() {
    let path = NodePath::root().child_key("a/b").child_index(2).child_key("m~n");

    assert_eq!(path.to_pointer(), "/a~1b/2/m~0n");
    assert!(NodePath::root().child_key("a/b").is_ancestor_of(&path));
    assert!(!path.is_ancestor_of(&path));
}
