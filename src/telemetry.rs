//! Telemetry metric name constants.
//!
//! Centralised metric names for mimir operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mimir_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider` — provider name (e.g. "openrouter", "sarvam")
//! - `kind` — generation kind ("question", "persona", "assessment", "translation")
//! - `status` — outcome: "ok", "fallback" or "cache"
//!
//! Fallback rate (`FALLBACKS_TOTAL / REQUESTS_TOTAL`) and retry rate
//! (`RETRIES_TOTAL / ATTEMPTS_TOTAL`) are the primary health signals.

/// Total `generate` calls answered by the router.
///
/// Labels: `kind`, `status` ("ok" | "fallback" | "cache").
pub const REQUESTS_TOTAL: &str = "mimir_requests_total";

/// End-to-end `generate` duration in seconds.
///
/// Labels: `kind`.
pub const REQUEST_DURATION_SECONDS: &str = "mimir_request_duration_seconds";

/// Total upstream attempts, including the first one.
///
/// Labels: `provider`.
pub const ATTEMPTS_TOTAL: &str = "mimir_attempts_total";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "mimir_retries_total";

/// Providers that failed a request after retries or on a fatal error.
///
/// Labels: `provider`, `reason` ("exhausted" | "fatal").
pub const PROVIDER_FAILURES_TOTAL: &str = "mimir_provider_failures_total";

/// Completions that no normalization strategy could parse.
///
/// Labels: `provider`, `kind`.
pub const PARSE_FAILURES_TOTAL: &str = "mimir_parse_failures_total";

/// Requests answered from the static template table.
///
/// Labels: `kind`, `reason` ("providers_failed" | "deadline").
pub const FALLBACKS_TOTAL: &str = "mimir_fallbacks_total";

/// Total cache hits.
pub const CACHE_HITS_TOTAL: &str = "mimir_cache_hits_total";

/// Total cache misses (including lazily purged expired entries).
pub const CACHE_MISSES_TOTAL: &str = "mimir_cache_misses_total";

/// Total entries removed by batched LRU eviction.
pub const CACHE_EVICTIONS_TOTAL: &str = "mimir_cache_evictions_total";

/// Generation calls refused because the session gate is terminal.
///
/// Labels: `status` ("exhausted" | "completed").
pub const GATE_REJECTIONS_TOTAL: &str = "mimir_gate_rejections_total";
