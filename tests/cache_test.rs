use std::collections::BTreeMap;
use std::time::Duration;

use mimir::cache::fingerprint;
use mimir::{BoundedCache, CacheConfig, GenerationKind};

fn ctx(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[tokio::test]
async fn never_exceeds_capacity() {
    let cache = BoundedCache::with_capacity(10, 0.2);

    for i in 0..=10 {
        cache.set(format!("k{i}"), i, Duration::from_secs(60));
        assert!(cache.len() <= 10);
    }

    let stats = cache.stats();
    assert!(stats.size <= stats.capacity);
    assert_eq!(stats.evictions, 2);
    // Newest entry always survives.
    assert_eq!(cache.get("k10"), Some(10));
}

#[tokio::test]
async fn eviction_drops_least_recently_used() {
    let cache = BoundedCache::with_capacity(3, 0.1);
    cache.set("a", 1, Duration::from_secs(60));
    cache.set("b", 2, Duration::from_secs(60));
    cache.set("c", 3, Duration::from_secs(60));

    // Touch "a" so "b" becomes the oldest.
    assert_eq!(cache.get("a"), Some(1));
    cache.set("d", 4, Duration::from_secs(60));

    assert_eq!(cache.get("b"), None);
    assert_eq!(cache.get("a"), Some(1));
    assert_eq!(cache.get("d"), Some(4));
}

#[tokio::test(start_paused = true)]
async fn entries_expire_after_ttl() {
    let cache = BoundedCache::with_capacity(10, 0.1);
    cache.set("question", "Why this role?".to_string(), Duration::from_secs(600));

    tokio::time::advance(Duration::from_secs(599)).await;
    assert!(cache.get("question").is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(cache.get("question").is_none());

    let stats = cache.stats();
    assert_eq!(stats.expirations, 1);
    assert_eq!(stats.size, 0);
}

#[tokio::test(start_paused = true)]
async fn expired_entries_are_purged_before_evicting_live_ones() {
    let cache = BoundedCache::with_capacity(2, 0.5);
    cache.set("short", 1, Duration::from_secs(1));
    cache.set("long", 2, Duration::from_secs(600));

    tokio::time::advance(Duration::from_secs(5)).await;
    cache.set("new", 3, Duration::from_secs(600));

    assert_eq!(cache.get("long"), Some(2));
    assert_eq!(cache.get("new"), Some(3));
    assert_eq!(cache.stats().evictions, 0);
}

#[tokio::test]
async fn overwrite_at_capacity_does_not_evict() {
    let cache = BoundedCache::with_capacity(2, 0.5);
    cache.set("a", 1, Duration::from_secs(60));
    cache.set("b", 2, Duration::from_secs(60));
    cache.set("a", 10, Duration::from_secs(60));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), Some(10));
    assert_eq!(cache.get("b"), Some(2));
}

#[test]
fn fingerprint_is_stable_and_ignores_insertion_order() {
    let a = ctx(&[("role", "sre"), ("level", "senior")]);
    let mut b = BTreeMap::new();
    b.insert("level".to_string(), "senior".to_string());
    b.insert("role".to_string(), "sre".to_string());

    assert_eq!(
        fingerprint(GenerationKind::Question, &a, "en"),
        fingerprint(GenerationKind::Question, &b, "en")
    );
}

#[test]
fn fingerprint_separates_kind_language_and_context() {
    let context = ctx(&[("role", "sre")]);
    let base = fingerprint(GenerationKind::Question, &context, "en");

    assert_ne!(base, fingerprint(GenerationKind::Persona, &context, "en"));
    assert_ne!(base, fingerprint(GenerationKind::Question, &context, "hi"));
    assert_ne!(
        base,
        fingerprint(GenerationKind::Question, &ctx(&[("role", "qa")]), "en")
    );
}

#[test]
fn config_builds_cache_with_its_capacity() {
    let config = CacheConfig::new().capacity(7);
    let cache: BoundedCache<String> = config.build();
    assert_eq!(cache.capacity(), 7);
    assert_eq!(
        config.ttl_for(GenerationKind::Translation),
        Duration::from_secs(86_400)
    );
}
