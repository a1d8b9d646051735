//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use super::Gateway;
use super::router::{DEFAULT_DEADLINE, ProviderRouter, check_deadline};
use crate::cache::CacheConfig;
use crate::providers::{Provider, ProviderRegistry, RetryExecutor, RetryPolicy};
use crate::session::{DEFAULT_CALL_LIMIT, SessionProgressGate};
use crate::templates::TemplateTable;
use crate::{MimirError, Result};

/// Main entry point for creating gateway instances.
pub struct Mimir;

impl Mimir {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> MimirBuilder {
        MimirBuilder::new()
    }
}

/// Builder for configuring gateway instances.
///
/// ```rust,ignore
/// let gateway = Mimir::builder()
///     .provider(native_hindi)
///     .provider(general)
///     .retry(RetryPolicy::new().max_attempts(3))
///     .call_limit(30)
///     .build()?;
/// ```
pub struct MimirBuilder {
    providers: Vec<Arc<dyn Provider>>,
    retry_policy: RetryPolicy,
    cache_config: CacheConfig,
    call_limit: u32,
    deadline: Duration,
    default_language: String,
    templates: Option<TemplateTable>,
}

impl MimirBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            retry_policy: RetryPolicy::default(),
            cache_config: CacheConfig::default(),
            call_limit: DEFAULT_CALL_LIMIT,
            deadline: DEFAULT_DEADLINE,
            default_language: "en".to_string(),
            templates: None,
        }
    }

    /// Register a provider. Registration order breaks ties in the fallback
    /// order.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Register a provider that is shared elsewhere.
    pub fn shared_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Set the retry policy applied to every provider call.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Set cache sizing and TTLs.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Set how many generation calls a session may make (default: 25).
    pub fn call_limit(mut self, limit: u32) -> Self {
        self.call_limit = limit;
        self
    }

    /// Set the overall budget of one `generate` call (default: 40s).
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the source language, ranked last among language-specific
    /// providers and used for template lookups (default: `en`).
    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into().trim().to_lowercase();
        self
    }

    /// Replace the built-in template table.
    pub fn templates(mut self, templates: TemplateTable) -> Self {
        self.templates = Some(templates);
        self
    }

    /// Build the gateway.
    pub fn build(self) -> Result<Gateway> {
        if self.providers.is_empty() {
            return Err(MimirError::NoProvider);
        }
        check_deadline(self.deadline)?;
        if self.default_language.is_empty() {
            return Err(MimirError::Configuration(
                "default language must not be empty".to_string(),
            ));
        }
        if self.retry_policy.max_attempts == 0 {
            return Err(MimirError::Configuration(
                "retry max_attempts must be at least 1".to_string(),
            ));
        }

        let mut registry = ProviderRegistry::new();
        for provider in self.providers {
            registry.add(provider);
        }

        let templates = self
            .templates
            .unwrap_or_else(TemplateTable::builtin)
            .default_language(self.default_language.clone());

        let router = ProviderRouter::new(
            registry,
            RetryExecutor::new(self.retry_policy),
            self.cache_config,
            templates,
            self.deadline,
            self.default_language,
        );

        Ok(Gateway::new(router, SessionProgressGate::new(self.call_limit)))
    }
}

impl Default for MimirBuilder {
    fn default() -> Self {
        Self::new()
    }
}
