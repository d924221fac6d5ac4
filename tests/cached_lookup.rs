use std::cell::RefCell;

use fincontext_core::cache::{
    entity_from_query, CachedLookup, FetchError, LookupSource, TtlCache,
};
use fincontext_core::config::CacheConfig;
use tempfile::tempdir;

fn open_cache(dir: &std::path::Path) -> TtlCache {
    TtlCache::open(&CacheConfig {
        enabled: true,
        dir: dir.to_path_buf(),
        ttl_hours: 24,
        reuse_entity_results: true,
    })
    .unwrap()
}

#[test]
fn fetches_once_then_serves_from_cache() {
    let dir = tempdir().unwrap();
    let calls = RefCell::new(Vec::new());
    let fetcher = |query: &str| -> Result<String, FetchError> {
        calls.borrow_mut().push(query.to_string());
        Ok(format!("result for {query}"))
    };
    let mut lookup = CachedLookup::new(fetcher, open_cache(dir.path()), false);

    let first = lookup.lookup(Some("Acme Ltd"), "acme debt").unwrap();
    assert_eq!(first.source, LookupSource::Fetched);
    assert_eq!(first.text, "result for acme debt");
    assert_eq!(first.entity.as_ref().map(|e| e.as_str()), Some("ACME"));

    let second = lookup.lookup(Some("ACME"), "acme debt").unwrap();
    assert_eq!(second.source, LookupSource::Cache);
    assert_eq!(second.text, "result for acme debt");

    // Exact-match policy: a new query still goes out.
    let third = lookup.lookup(Some("Acme"), "acme news").unwrap();
    assert_eq!(third.source, LookupSource::Fetched);

    assert_eq!(*calls.borrow(), vec!["acme debt", "acme news"]);
}

#[test]
fn entity_reuse_answers_new_queries_from_any_cached_result() {
    let dir = tempdir().unwrap();
    let calls = RefCell::new(0);
    let fetcher = |query: &str| -> Result<String, FetchError> {
        *calls.borrow_mut() += 1;
        Ok(format!("fetched {query}"))
    };
    let mut lookup = CachedLookup::new(fetcher, open_cache(dir.path()), true);

    lookup.lookup(Some("Acme"), "acme debt").unwrap();
    let reused = lookup.lookup(Some("Acme"), "acme peers").unwrap();

    assert_eq!(*calls.borrow(), 1);
    assert_eq!(reused.source, LookupSource::EntityCache { queries: 1 });
    assert_eq!(reused.text, "=== Cached: acme debt ===\nfetched acme debt");

    // The combined answer is stored under the new query too.
    let all = lookup.cache().get_all("Acme");
    assert_eq!(all.len(), 2);
    assert_eq!(all["acme peers"], reused.text);

    let again = lookup.lookup(Some("Acme"), "acme roe").unwrap();
    assert_eq!(again.source, LookupSource::EntityCache { queries: 2 });
    assert_eq!(
        again.text,
        [
            "=== Cached: acme debt ===\nfetched acme debt",
            "=== Cached: acme peers ===\n=== Cached: acme debt ===\nfetched acme debt",
        ]
        .join("\n\n")
    );
    assert_eq!(*calls.borrow(), 1);
}

#[test]
fn entity_is_guessed_from_query_when_not_given() {
    let dir = tempdir().unwrap();
    let fetcher = |_: &str| -> Result<String, FetchError> { Ok("answer".to_string()) };
    let mut lookup = CachedLookup::new(fetcher, open_cache(dir.path()), true);

    let outcome = lookup.lookup(None, "What is Reliance Industries ROCE").unwrap();
    assert_eq!(outcome.entity.as_ref().map(|e| e.as_str()), Some("RELIANCE INDUSTRIES"));
    assert_eq!(
        lookup.cache().get_all("reliance industries")["What is Reliance Industries ROCE"],
        "answer"
    );
}

#[test]
fn no_entity_means_no_caching() {
    let dir = tempdir().unwrap();
    let calls = RefCell::new(0);
    let fetcher = |_: &str| -> Result<String, FetchError> {
        *calls.borrow_mut() += 1;
        Ok("x".to_string())
    };
    let mut lookup = CachedLookup::new(fetcher, open_cache(dir.path()), true);

    lookup.lookup(None, "pe").unwrap();
    lookup.lookup(None, "pe").unwrap();
    assert_eq!(*calls.borrow(), 2);
    assert!(lookup.cache().is_empty());
}

#[test]
fn fetch_errors_propagate_and_are_not_cached() {
    let dir = tempdir().unwrap();
    let fetcher = |_: &str| -> Result<String, FetchError> { Err(FetchError::new("rate limited")) };
    let mut lookup = CachedLookup::new(fetcher, open_cache(dir.path()), true);

    let err = lookup.lookup(Some("Acme"), "acme debt").unwrap_err();
    assert_eq!(err, FetchError::new("rate limited"));
    assert_eq!(err.to_string(), "Lookup failed: rate limited");
    assert!(lookup.into_cache().get_all("Acme").is_empty());
}

#[test]
fn disabled_cache_always_fetches() {
    let calls = RefCell::new(0);
    let fetcher = |_: &str| -> Result<String, FetchError> {
        *calls.borrow_mut() += 1;
        Ok("x".to_string())
    };
    let mut lookup = CachedLookup::new(fetcher, TtlCache::disabled(), true);

    lookup.lookup(Some("Acme"), "q").unwrap();
    lookup.lookup(Some("Acme"), "q").unwrap();
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn entity_guessing_rules() {
    assert_eq!(
        entity_from_query("find Tata Motors debt levels").as_deref(),
        Some("TATA MOTORS")
    );
    assert_eq!(
        entity_from_query("show me the Infosys news").as_deref(),
        Some("INFOSYS")
    );
    assert_eq!(entity_from_query("AB ratio"), None);
    assert_eq!(entity_from_query("roe"), Some("ROE".to_string()));
}
