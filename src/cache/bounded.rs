//! Capacity- and TTL-bounded store with batched LRU eviction.
//!
//! ```text
//!  set(k, v, ttl) at capacity
//!        │
//!        ▼
//!  purge expired ──► still full? ──► pop ⌈capacity × fraction⌉ LRU entries
//!                                                  │
//!                                                  ▼
//!                                               insert
//! ```
//!
//! The recency list lives in an [`lru::LruCache`] guarded by one mutex;
//! critical sections never await. Timestamps use [`tokio::time::Instant`]
//! so TTL behaviour follows a paused test clock.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 100;

/// Default share of entries dropped per eviction sweep.
pub const DEFAULT_EVICTION_FRACTION: f64 = 0.10;

/// Shortest TTL accepted; keeps `expires_at > inserted_at`.
const MIN_TTL: Duration = Duration::from_millis(1);

/// One stored value with its bookkeeping. Never handed out by reference.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    pub inserted_at: Instant,
    pub expires_at: Instant,
    pub last_accessed_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped by LRU eviction sweeps.
    pub evictions: u64,
    /// Entries dropped because their TTL had passed.
    pub expirations: u64,
}

struct Inner<V> {
    entries: LruCache<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// Bounded key → value cache shared across sessions.
///
/// Values are snapshots: [`get`](Self::get) returns a clone.
pub struct BoundedCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
    eviction_batch: usize,
}

impl<V: Clone> BoundedCache<V> {
    /// A cache with the default capacity and eviction fraction.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, DEFAULT_EVICTION_FRACTION)
    }

    /// A cache holding at most `capacity` entries (minimum 1), dropping
    /// `max(1, ⌈capacity × eviction_fraction⌉)` entries per sweep.
    pub fn with_capacity(capacity: usize, eviction_fraction: f64) -> Self {
        let capacity = capacity.max(1);
        let fraction = if eviction_fraction.is_finite() {
            eviction_fraction.clamp(0.0, 1.0)
        } else {
            DEFAULT_EVICTION_FRACTION
        };
        let eviction_batch = ((capacity as f64 * fraction).ceil() as usize).clamp(1, capacity);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            capacity,
            eviction_batch,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries removed per eviction sweep.
    pub fn eviction_batch(&self) -> usize {
        self.eviction_batch
    }

    /// Look up a live value, refreshing its recency.
    ///
    /// An expired entry is purged on the spot and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_accessed_at = now;
                let value = entry.value.clone();
                inner.hits += 1;
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.pop(key);
            inner.expirations += 1;
            debug!(key, "cache entry expired");
        }
        inner.misses += 1;
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        None
    }

    /// Store `value` under `key` for `ttl`, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let now = Instant::now();
        let entry = CacheEntry {
            key: key.clone(),
            value,
            inserted_at: now,
            expires_at: now + ttl.max(MIN_TTL),
            last_accessed_at: now,
        };

        let mut guard = self.lock();
        let inner = &mut *guard;
        if !inner.entries.contains(&key) && inner.entries.len() >= self.capacity {
            self.make_room(inner, now);
        }
        inner.entries.put(key, entry);
    }

    fn make_room(&self, inner: &mut Inner<V>, now: Instant) {
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            inner.entries.pop(key);
        }
        inner.expirations += expired.len() as u64;

        if inner.entries.len() < self.capacity {
            return;
        }

        let mut evicted = 0u64;
        for _ in 0..self.eviction_batch {
            if inner.entries.pop_lru().is_none() {
                break;
            }
            evicted += 1;
        }
        inner.evictions += evicted;
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL).increment(evicted);
        debug!(
            evicted,
            purged = expired.len(),
            capacity = self.capacity,
            "cache eviction sweep"
        );
    }

    /// Drop one entry. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().entries.pop(key).is_some()
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Number of stored entries, expired ones not yet purged included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }

    /// Bookkeeping snapshot for one key, without touching its recency.
    pub fn entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.lock().entries.peek(key).cloned()
    }
}

impl<V: Clone> Default for BoundedCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for BoundedCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("capacity", &self.capacity)
            .field("eviction_batch", &self.eviction_batch)
            .finish_non_exhaustive()
    }
}
