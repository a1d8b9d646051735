//! Provider capability trait.
//!
//! Every upstream text-generation service implements one uniform trait,
//! [`Provider`]. The router never branches on provider names: it filters and
//! sorts a registry of `Arc<dyn Provider>` by their [`ProviderDescriptor`]s.
//!
//! # Failure semantics
//!
//! Transports surface typed errors so the retry loop can classify them:
//! - `RateLimited`, `Timeout`, `Http`, `Api { 5xx }` — retried
//! - `AuthenticationFailed`, `QuotaExceeded`, other `Api` — fatal for this
//!   provider; the router moves on to the next one
//!
//! # Example
//!
//! ```ignore
//! #[async_trait]
//! impl Provider for EchoProvider {
//!     fn descriptor(&self) -> &ProviderDescriptor {
//!         &self.descriptor
//!     }
//!
//!     async fn invoke(&self, request: &InvokeRequest) -> Result<String> {
//!         Ok(request.messages.last().map(|m| m.content.clone()).unwrap_or_default())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::Result;
use crate::types::{InvokeRequest, ProviderDescriptor};

/// An external text-generation service.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Routing metadata (name, priority, languages, availability).
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Provider name for logging/metrics.
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Perform one upstream call and return the raw completion text.
    async fn invoke(&self, request: &InvokeRequest) -> Result<String>;
}
