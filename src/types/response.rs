//! Completion and result types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::GenerationKind;

/// Source name reported for results served from the cache.
pub const CACHE_SOURCE: &str = "cache";

/// Source name reported for results synthesized from the template table.
pub const TEMPLATE_SOURCE: &str = "template";

/// Raw text returned by one successful provider attempt.
///
/// Transient: produced per attempt and discarded after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    pub text: String,
    pub provider_name: String,
    pub latency_ms: u64,
}

/// The unit returned to callers and stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub kind: GenerationKind,
    pub fields: Map<String, Value>,
    pub source_provider: String,
    pub used_fallback: bool,
}

impl NormalizedResult {
    /// A result produced by a provider.
    pub fn from_provider(
        kind: GenerationKind,
        fields: Map<String, Value>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            fields,
            source_provider: provider.into(),
            used_fallback: false,
        }
    }

    /// A result synthesized from the static template table.
    pub fn from_template(kind: GenerationKind, fields: Map<String, Value>) -> Self {
        Self {
            kind,
            fields,
            source_provider: TEMPLATE_SOURCE.to_string(),
            used_fallback: true,
        }
    }

    /// The view handed out on a cache hit.
    pub fn served_from_cache(mut self) -> Self {
        self.source_provider = CACHE_SOURCE.to_string();
        self.used_fallback = false;
        self
    }

    /// String field accessor.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Numeric field accessor.
    pub fn field_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Value::as_f64)
    }

    /// The question text, for [`GenerationKind::Question`] results.
    pub fn question(&self) -> Option<&str> {
        match self.kind {
            GenerationKind::Question => self.field_str("question"),
            _ => None,
        }
    }
}
