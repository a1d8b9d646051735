//! Gateway implementations

mod builder;
pub mod router;

pub use builder::{Mimir, MimirBuilder};
pub use router::ProviderRouter;

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::CacheStats;
use crate::config::{MimirConfig, Secrets};
use crate::session::{SessionGateState, SessionProgressGate, SessionStatus};
use crate::telemetry;
use crate::traits::ContentGateway;
use crate::types::{GenerationKind, GenerationRequest, NormalizedResult, ProviderDescriptor};
use crate::{MimirError, Result};

/// The assembled orchestration layer: router plus session gate.
///
/// Construct once at process start with [`Mimir::builder()`] or
/// [`Gateway::from_config`] and share it (e.g. behind an `Arc`).
#[derive(Debug)]
pub struct Gateway {
    router: ProviderRouter,
    gate: SessionProgressGate,
}

impl Gateway {
    pub(crate) fn new(router: ProviderRouter, gate: SessionProgressGate) -> Self {
        Self { router, gate }
    }

    /// Build a gateway from a loaded configuration file and secrets.
    pub fn from_config(config: &MimirConfig, secrets: &Secrets) -> Result<Self> {
        let mut builder = Mimir::builder()
            .retry(config.retry.policy())
            .cache(config.cache.cache_config())
            .call_limit(config.gate.call_limit)
            .deadline(Duration::from_secs(config.router.deadline_secs))
            .default_language(&config.router.default_language);

        for entry in config.enabled_providers() {
            builder = builder.shared_provider(entry.build(secrets)?);
        }
        builder.build()
    }

    pub fn router(&self) -> &ProviderRouter {
        &self.router
    }

    pub fn gate(&self) -> &SessionProgressGate {
        &self.gate
    }

    /// Provider descriptors in the order `(kind, language)` requests try them.
    pub fn fallback_order(&self, kind: GenerationKind, language: &str) -> Vec<ProviderDescriptor> {
        self.router
            .fallback_order(kind, &language.trim().to_lowercase())
    }
}

#[async_trait]
impl ContentGateway for Gateway {
    async fn generate(&self, request: &GenerationRequest) -> Result<NormalizedResult> {
        request.validate()?;
        let session_id = request.session_id();

        if !self.gate.can_generate(session_id) {
            let status = self
                .gate
                .status(session_id)
                .map_or(SessionStatus::Exhausted, |s| s.status);
            warn!(session_id, %status, "generation refused by session gate");
            metrics::counter!(telemetry::GATE_REJECTIONS_TOTAL, "status" => status.as_str())
                .increment(1);
            return Err(MimirError::SessionClosed {
                session_id: session_id.to_string(),
                status,
            });
        }

        let result = self.router.generate(request).await?;
        let status = self.gate.record_call(session_id);
        debug!(session_id, %status, source = %result.source_provider, "generation recorded");
        Ok(result)
    }

    fn cache_stats(&self) -> CacheStats {
        self.router.cache_stats()
    }

    fn session_status(&self, session_id: &str) -> Option<SessionGateState> {
        self.gate.status(session_id)
    }

    fn can_generate(&self, session_id: &str) -> bool {
        self.gate.can_generate(session_id)
    }

    fn mark_completed(&self, session_id: &str) -> SessionStatus {
        self.gate.mark_completed(session_id)
    }

    fn evict_session(&self, session_id: &str) -> Option<SessionGateState> {
        self.gate.evict(session_id)
    }
}
