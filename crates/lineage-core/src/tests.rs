//! Unit tests for the discovery model, the tree parser, and the cache.

use bytes::Bytes;

use crate::{
  cache::{CacheConfig, ImageCache},
  document::{QueryTemplate, parse_service_document, resolve_ancestry_template},
  error::Error,
  person::parse_ancestry_tree,
};

// ─── Query template derivation ───────────────────────────────────────────────

#[test]
fn template_truncated_at_first_placeholder() {
  let t = QueryTemplate::from_template("https://x/{p}").unwrap();
  assert_eq!(t.as_str(), "https://x/");
}

#[test]
fn template_without_placeholder_passes_through() {
  let t = QueryTemplate::from_template("https://x/tree/ancestry").unwrap();
  assert_eq!(t.as_str(), "https://x/tree/ancestry");
}

#[test]
fn template_with_leading_placeholder_is_rejected() {
  let err = QueryTemplate::from_template("{base}/ancestry").unwrap_err();
  assert!(matches!(err, Error::EmptyTemplate));
}

// ─── Service document resolution ─────────────────────────────────────────────

fn discovery_body(template: &str) -> String {
  format!(
    r#"{{"collections":[{{"links":{{"ancestry-query":{{"template":"{template}"}},"self":{{"href":"https://x/"}}}}}}]}}"#
  )
}

#[test]
fn resolve_extracts_prefix_from_first_collection() {
  let doc =
    parse_service_document(discovery_body("https://x/tree{?person,generations}").as_bytes())
      .unwrap();
  let t = resolve_ancestry_template(&doc).unwrap();
  assert_eq!(t.as_str(), "https://x/tree");
}

#[test]
fn resolve_fails_on_empty_collections() {
  let doc = parse_service_document(br#"{"collections":[]}"#).unwrap();
  let err = resolve_ancestry_template(&doc).unwrap_err();
  assert!(matches!(err, Error::NoCollections));
}

#[test]
fn resolve_fails_without_ancestry_query_link() {
  let doc = parse_service_document(
    br#"{"collections":[{"links":{"self":{"href":"https://x/"}}}]}"#,
  )
  .unwrap();
  let err = resolve_ancestry_template(&doc).unwrap_err();
  assert!(matches!(err, Error::MissingAncestryQuery));
}

#[test]
fn parse_service_document_rejects_non_json() {
  let err = parse_service_document(b"<html>nope</html>").unwrap_err();
  assert!(matches!(err, Error::Json(_)));
}

// ─── Tree parsing ────────────────────────────────────────────────────────────

#[test]
fn parse_tree_happy_path() {
  let body = br#"{"persons":[{
    "display":{"name":"Jane Doe","lifespan":"1900-1980"},
    "links":{"person":{"href":"http://img/1"}}
  }]}"#;
  let records = parse_ancestry_tree(body).unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].display_name, "Jane Doe");
  assert_eq!(records[0].lifespan, "1900-1980");
  assert_eq!(records[0].image_link_href.as_deref(), Some("http://img/1"));
}

#[test]
fn parse_tree_preserves_document_order() {
  let body = br#"{"persons":[
    {"display":{"name":"A","lifespan":"1-2"}},
    {"display":{"name":"B","lifespan":"3-4"}},
    {"display":{"name":"C","lifespan":"5-6"}}
  ]}"#;
  let names: Vec<_> = parse_ancestry_tree(body)
    .unwrap()
    .into_iter()
    .map(|r| r.display_name)
    .collect();
  assert_eq!(names, ["A", "B", "C"]);
}

#[test]
fn parse_tree_missing_name_fails_whole_fetch() {
  let body = br#"{"persons":[
    {"display":{"name":"A","lifespan":"1-2"}},
    {"display":{"lifespan":"3-4"}}
  ]}"#;
  let err = parse_ancestry_tree(body).unwrap_err();
  assert!(matches!(
    err,
    Error::MissingField {
      index: 1,
      field:  "display.name",
    }
  ));
}

#[test]
fn parse_tree_missing_lifespan_fails_whole_fetch() {
  let body = br#"{"persons":[{"display":{"name":"A"}}]}"#;
  let err = parse_ancestry_tree(body).unwrap_err();
  assert!(matches!(
    err,
    Error::MissingField {
      field: "display.lifespan",
      ..
    }
  ));
}

#[test]
fn parse_tree_missing_href_is_not_an_error() {
  let body = br#"{"persons":[{"display":{"name":"A","lifespan":"1-2"},"links":{}}]}"#;
  let records = parse_ancestry_tree(body).unwrap();
  assert_eq!(records[0].image_link_href, None);
}

#[test]
fn parse_tree_empty_persons_yields_empty_list() {
  let records = parse_ancestry_tree(br#"{"persons":[]}"#).unwrap();
  assert!(records.is_empty());
}

// ─── Image cache ─────────────────────────────────────────────────────────────

fn small_cache(count_limit: usize, total_cost_limit: usize) -> ImageCache {
  ImageCache::new(CacheConfig {
    count_limit,
    total_cost_limit,
  })
}

#[test]
fn cache_get_after_put_returns_same_bytes() {
  let cache = small_cache(4, 1024);
  cache.put("http://img/1", Bytes::from_static(b"abc"));
  assert_eq!(cache.get("http://img/1"), Some(Bytes::from_static(b"abc")));
  // Idempotent: repeated gets without an intervening put agree.
  assert_eq!(cache.get("http://img/1"), Some(Bytes::from_static(b"abc")));
}

#[test]
fn cache_miss_returns_none() {
  let cache = small_cache(4, 1024);
  assert_eq!(cache.get("http://img/none"), None);
}

#[test]
fn cache_count_limit_evicts_least_recently_used() {
  let cache = small_cache(2, 1024);
  cache.put("a", Bytes::from_static(b"1"));
  cache.put("b", Bytes::from_static(b"2"));
  // Touch "a" so "b" becomes the LRU entry.
  cache.get("a");
  cache.put("c", Bytes::from_static(b"3"));

  assert_eq!(cache.len(), 2);
  assert!(cache.get("a").is_some());
  assert!(cache.get("b").is_none());
  assert!(cache.get("c").is_some());
}

#[test]
fn cache_cost_limit_holds_after_eviction() {
  let cache = small_cache(10, 10);
  cache.put("a", Bytes::from(vec![0u8; 6]));
  cache.put("b", Bytes::from(vec![0u8; 6]));
  assert!(cache.total_cost() <= 10);
  // The older entry was evicted to make room.
  assert!(cache.get("a").is_none());
  assert!(cache.get("b").is_some());
}

#[test]
fn cache_rejects_entry_larger_than_total_limit() {
  let cache = small_cache(10, 10);
  cache.put("a", Bytes::from(vec![0u8; 4]));
  cache.put("huge", Bytes::from(vec![0u8; 11]));
  // The oversized entry is dropped without disturbing residents.
  assert!(cache.get("huge").is_none());
  assert!(cache.get("a").is_some());
  assert_eq!(cache.total_cost(), 4);
}

#[test]
fn cache_replacing_a_key_updates_cost() {
  let cache = small_cache(10, 100);
  cache.put("a", Bytes::from(vec![0u8; 40]));
  cache.put("a", Bytes::from(vec![0u8; 10]));
  assert_eq!(cache.len(), 1);
  assert_eq!(cache.total_cost(), 10);
}
