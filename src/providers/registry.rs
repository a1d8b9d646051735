//! Static provider registry.
//!
//! The `ProviderRegistry` stores providers in registration order. It never decides anything on its own: the
//! per-request fallback order comes from [`rank_providers`], which filters
//! and sorts by each provider's [`ProviderDescriptor`](crate::ProviderDescriptor).
//! Adding a provider is purely additive, no name-based branching anywhere.
//!
//! ```text
//! generate(Question, "hi")
//!          │
//!          ▼
//!  ┌──────────────────┐   rank_providers()   ┌──────────────────────────┐
//!  │ ProviderRegistry │ ───────────────────► │ sarvam  (native hi, p=0) │
//!  │  registration    │                      │ gemini  (general,  p=1)  │
//!  │  order           │                      │ local   (en only,  p=0)  │  ✗ dropped
//!  └──────────────────┘                      └──────────────────────────┘
//! ```

use std::sync::Arc;

use super::routing::rank_providers;
use super::traits::Provider;
use crate::types::GenerationKind;

/// Registry of providers, read-only once the gateway is built.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Order of registration only breaks ties between
    /// providers of equal tier and priority.
    pub fn add(&mut self, provider: Arc<dyn Provider>) {
        self.entries.push(provider);
    }

    /// Providers able to serve `(kind, target_language)`, in fallback order.
    pub fn ordered_for(
        &self,
        kind: GenerationKind,
        target_language: &str,
        default_language: &str,
    ) -> Vec<Arc<dyn Provider>> {
        let order = rank_providers(
            self.entries.iter().map(|p| p.descriptor()),
            kind,
            target_language,
            default_language,
        );
        order
            .into_iter()
            .map(|idx| Arc::clone(&self.entries[idx]))
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|p| p.name()))
            .finish()
    }
}
