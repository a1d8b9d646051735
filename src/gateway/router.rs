//! ProviderRouter: cache → ordered providers → template fallback.
//!
//! ```text
//! generate(request)
//!   │ validate (fatal errors propagate)
//!   ├─ cache hit ───────────────────────────────► result (source "cache")
//!   │
//!   ├─ within deadline:
//!   │    for provider in fallback order:
//!   │       RetryExecutor ─► ResponseNormalizer ─► cache (kind TTL) ─► result
//!   │       (exhausted / fatal / unparseable → next provider)
//!   │
//!   └─ nothing worked, or deadline passed:
//!        template table ─► cache (short TTL) ─► result (used_fallback)
//! ```
//!
//! Provider and parse failures never escape: the only error `generate`
//! returns is a malformed request.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::cache::{BoundedCache, CacheConfig, CacheStats, request_fingerprint};
use crate::normalize::ResponseNormalizer;
use crate::prompt;
use crate::providers::{Provider, ProviderRegistry, RetryExecutor};
use crate::telemetry;
use crate::templates::TemplateTable;
use crate::types::{
    GenerationKind, GenerationRequest, InvokeRequest, NormalizedResult, ProviderDescriptor,
};
use crate::{MimirError, Result};

/// Default overall budget for one `generate` call.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(40);

/// Routes generation requests across providers with caching and fallback.
pub struct ProviderRouter {
    registry: ProviderRegistry,
    executor: RetryExecutor,
    normalizer: ResponseNormalizer,
    cache: BoundedCache<NormalizedResult>,
    cache_config: CacheConfig,
    templates: TemplateTable,
    deadline: Duration,
    default_language: String,
}

impl ProviderRouter {
    pub(crate) fn new(
        registry: ProviderRegistry,
        executor: RetryExecutor,
        cache_config: CacheConfig,
        templates: TemplateTable,
        deadline: Duration,
        default_language: String,
    ) -> Self {
        Self {
            registry,
            executor,
            normalizer: ResponseNormalizer::new(),
            cache: cache_config.build(),
            cache_config,
            templates,
            deadline,
            default_language,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Descriptors in the order `generate` would try them.
    pub fn fallback_order(
        &self,
        kind: GenerationKind,
        target_language: &str,
    ) -> Vec<ProviderDescriptor> {
        self.registry
            .ordered_for(kind, target_language, &self.default_language)
            .iter()
            .map(|p| p.descriptor().clone())
            .collect()
    }

    /// Produce a result for `request`, degrading to the template table.
    #[instrument(
        name = "mimir.generate",
        skip(self, request),
        fields(kind = %request.kind(), language = %request.target_language())
    )]
    pub async fn generate(&self, request: &GenerationRequest) -> Result<NormalizedResult> {
        request.validate()?;
        let kind = request.kind();
        let started = Instant::now();
        let key = request_fingerprint(request);

        if let Some(hit) = self.cache.get(&key) {
            debug!(key = %key, "serving from cache");
            self.finish(request, "cache", started);
            return Ok(hit.served_from_cache());
        }

        let providers =
            self.registry
                .ordered_for(kind, request.target_language(), &self.default_language);
        let call = prompt::build(request);

        let outcome = tokio::time::timeout(
            self.deadline,
            self.try_providers(&providers, &call, request),
        )
        .await;

        let reason = match outcome {
            Ok(Some(result)) => {
                self.cache
                    .set(key, result.clone(), self.cache_config.ttl_for(kind));
                self.finish(request, "ok", started);
                return Ok(result);
            }
            Ok(None) => "providers_failed",
            Err(_) => {
                warn!(
                    deadline_ms = self.deadline.as_millis() as u64,
                    "generation deadline passed, short-circuiting to template"
                );
                "deadline"
            }
        };

        let result = self.template_result(request);
        info!(
            reason,
            providers = providers.len(),
            "answering from template table"
        );
        metrics::counter!(telemetry::FALLBACKS_TOTAL, "kind" => kind.as_str(), "reason" => reason)
            .increment(1);
        self.cache
            .set(key, result.clone(), self.cache_config.fallback_ttl);
        self.finish(request, "fallback", started);
        Ok(result)
    }

    async fn try_providers(
        &self,
        providers: &[Arc<dyn Provider>],
        call: &InvokeRequest,
        request: &GenerationRequest,
    ) -> Option<NormalizedResult> {
        let kind = request.kind();
        let language = request.target_language();

        for provider in providers {
            let name = provider.name();
            let raw = match self.executor.execute(name, || provider.invoke(call)).await {
                Ok(raw) => raw,
                Err(e) => {
                    let reason = if e.is_exhausted() { "exhausted" } else { "fatal" };
                    warn!(provider = name, reason, error = %e, "provider failed, trying next");
                    metrics::counter!(
                        telemetry::PROVIDER_FAILURES_TOTAL,
                        "provider" => name.to_owned(),
                        "reason" => reason
                    )
                    .increment(1);
                    continue;
                }
            };
            debug!(provider = name, latency_ms = raw.latency_ms, "completion received");

            match self.normalizer.normalize(&raw, kind, language) {
                Ok(result) => return Some(result),
                Err(e) => {
                    warn!(provider = name, error = %e, "unparseable completion, trying next");
                    metrics::counter!(
                        telemetry::PARSE_FAILURES_TOTAL,
                        "provider" => name.to_owned(),
                        "kind" => kind.as_str()
                    )
                    .increment(1);
                }
            }
        }
        None
    }

    fn template_result(&self, request: &GenerationRequest) -> NormalizedResult {
        let fields = self.templates.render(
            request.kind(),
            request.target_language(),
            request.prompt_context(),
        );
        NormalizedResult::from_template(request.kind(), fields)
    }

    fn finish(&self, request: &GenerationRequest, status: &'static str, started: Instant) {
        let kind = request.kind().as_str();
        metrics::counter!(telemetry::REQUESTS_TOTAL, "kind" => kind, "status" => status)
            .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "kind" => kind)
            .record(started.elapsed().as_secs_f64());
    }
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("registry", &self.registry)
            .field("retry", self.executor.policy())
            .field("cache", &self.cache)
            .field("deadline", &self.deadline)
            .field("default_language", &self.default_language)
            .finish_non_exhaustive()
    }
}

/// Build-time sanity checks shared by the builder and config loading.
pub(crate) fn check_deadline(deadline: Duration) -> Result<()> {
    if deadline.is_zero() {
        return Err(MimirError::Configuration(
            "generation deadline must be positive".to_string(),
        ));
    }
    Ok(())
}
