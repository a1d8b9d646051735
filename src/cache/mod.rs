//! Result caching.
//!
//! - [`BoundedCache`] — capacity- and TTL-bounded store with batched LRU
//!   eviction, shared process-wide behind one mutex.
//! - [`CacheConfig`] — capacity, eviction fraction and per-kind TTLs used by
//!   the router.
//! - [`fingerprint`] — the content-derived cache key of a request.
//!
//! Entries are fingerprinted by content, never by session: two sessions
//! asking for the same `(kind, prompt context, language)` share one entry.

pub mod bounded;

pub use bounded::{BoundedCache, CacheEntry, CacheStats};

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::types::{GenerationKind, GenerationRequest};

/// Cache sizing and TTLs.
///
/// ```rust
/// # use mimir::CacheConfig;
/// # use mimir::GenerationKind;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .capacity(500)
///     .ttl(GenerationKind::Question, Duration::from_secs(120));
/// assert_eq!(config.ttl_for(GenerationKind::Question), Duration::from_secs(120));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Maximum number of entries. Default: 100.
    pub capacity: usize,
    /// Share of entries dropped per eviction sweep. Default: 0.10.
    pub eviction_fraction: f64,
    /// Lifetime of provider results, per kind.
    pub question_ttl: Duration,
    pub persona_ttl: Duration,
    pub assessment_ttl: Duration,
    pub translation_ttl: Duration,
    /// Lifetime of template fallbacks, short so an outage is retried soon.
    /// Default: 30s.
    pub fallback_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: bounded::DEFAULT_CAPACITY,
            eviction_fraction: bounded::DEFAULT_EVICTION_FRACTION,
            question_ttl: Duration::from_secs(600),
            persona_ttl: Duration::from_secs(3_600),
            assessment_ttl: Duration::from_secs(1_800),
            translation_ttl: Duration::from_secs(86_400),
            fallback_ttl: Duration::from_secs(30),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of entries.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the share of entries dropped per eviction sweep.
    pub fn eviction_fraction(mut self, fraction: f64) -> Self {
        self.eviction_fraction = fraction;
        self
    }

    /// Set the TTL of provider results for one kind.
    pub fn ttl(mut self, kind: GenerationKind, ttl: Duration) -> Self {
        match kind {
            GenerationKind::Question => self.question_ttl = ttl,
            GenerationKind::Persona => self.persona_ttl = ttl,
            GenerationKind::Assessment => self.assessment_ttl = ttl,
            GenerationKind::Translation => self.translation_ttl = ttl,
        }
        self
    }

    /// Set the TTL of template fallbacks.
    pub fn fallback_ttl(mut self, ttl: Duration) -> Self {
        self.fallback_ttl = ttl;
        self
    }

    /// TTL of provider results for `kind`.
    pub fn ttl_for(&self, kind: GenerationKind) -> Duration {
        match kind {
            GenerationKind::Question => self.question_ttl,
            GenerationKind::Persona => self.persona_ttl,
            GenerationKind::Assessment => self.assessment_ttl,
            GenerationKind::Translation => self.translation_ttl,
        }
    }

    /// Build an empty cache with this sizing.
    pub fn build<V: Clone>(&self) -> BoundedCache<V> {
        BoundedCache::with_capacity(self.capacity, self.eviction_fraction)
    }
}

/// Cache key for `(kind, prompt context, language)`.
///
/// The context is hashed in key order, so insertion order never matters.
/// Format: `{kind}:{language}:{hash:016x}`.
pub fn fingerprint(
    kind: GenerationKind,
    prompt_context: &BTreeMap<String, String>,
    language: &str,
) -> String {
    let mut hasher = DefaultHasher::new();
    for (key, value) in prompt_context {
        key.hash(&mut hasher);
        value.hash(&mut hasher);
    }
    format!("{kind}:{language}:{:016x}", hasher.finish())
}

/// [`fingerprint`] of a built request.
pub fn request_fingerprint(request: &GenerationRequest) -> String {
    fingerprint(
        request.kind(),
        request.prompt_context(),
        request.target_language(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_ttls() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 100);
        assert_eq!(config.ttl_for(GenerationKind::Question), Duration::from_secs(600));
        assert_eq!(config.ttl_for(GenerationKind::Translation), Duration::from_secs(86_400));
        assert!(config.fallback_ttl < config.ttl_for(GenerationKind::Question));
    }

    #[test]
    fn fingerprint_is_deterministic_and_prefixed() {
        let ctx = context(&[("role", "backend"), ("level", "senior")]);
        let a = fingerprint(GenerationKind::Question, &ctx, "en");
        let b = fingerprint(GenerationKind::Question, &ctx, "en");
        assert_eq!(a, b);
        assert!(a.starts_with("question:en:"));
        assert_eq!(a.len(), "question:en:".len() + 16);
    }

    #[test]
    fn fingerprint_differs_on_each_component() {
        let ctx = context(&[("role", "backend")]);
        let base = fingerprint(GenerationKind::Question, &ctx, "en");
        assert_ne!(base, fingerprint(GenerationKind::Persona, &ctx, "en"));
        assert_ne!(base, fingerprint(GenerationKind::Question, &ctx, "hi"));
        assert_ne!(
            base,
            fingerprint(GenerationKind::Question, &context(&[("role", "frontend")]), "en")
        );
    }

    #[test]
    fn fingerprint_separates_key_and_value_boundaries() {
        let a = context(&[("ab", "c")]);
        let b = context(&[("a", "bc")]);
        assert_ne!(
            fingerprint(GenerationKind::Question, &a, "en"),
            fingerprint(GenerationKind::Question, &b, "en")
        );
    }

    #[test]
    fn request_fingerprint_ignores_session() {
        let build = |session: &str| {
            GenerationRequest::builder(GenerationKind::Question)
                .context("role", "pm")
                .session(session)
                .build()
        };
        assert_eq!(
            request_fingerprint(&build("s1")),
            request_fingerprint(&build("s2"))
        );
    }
}
