//! Mimir - resilient content generation for interview coaching
//!
//! This crate turns a content-generation request ("next interview question",
//! "STAR assessment", ...) into a usable result with bounded latency, even
//! when upstream LLM providers throttle, time out or return malformed text:
//!
//! - [`RetryExecutor`] retries one provider with exponential backoff + jitter
//! - [`ResponseNormalizer`] extracts schema-conforming data from free text
//! - [`ProviderRouter`] walks an ordered provider list and falls back to a
//!   static [`TemplateTable`]
//! - [`BoundedCache`] keeps recent results under capacity and TTL bounds
//! - [`SessionProgressGate`] limits how many calls a session may make
//!
//! # Example
//!
//! ```rust,no_run
//! use mimir::providers::{ChatBackend, LlmChatProvider};
//! use mimir::{ContentGateway, GenerationKind, GenerationRequest, Mimir, ProviderDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> mimir::Result<()> {
//!     let gateway = Mimir::builder()
//!         .provider(
//!             LlmChatProvider::new(
//!                 ProviderDescriptor::new("openrouter", 0),
//!                 ChatBackend::OpenRouter,
//!                 "google/gemini-2.0-flash-001",
//!             )
//!             .api_key("sk-or-your-key"),
//!         )
//!         .build()?;
//!
//!     let request = GenerationRequest::builder(GenerationKind::Question)
//!         .context("role", "backend engineer")
//!         .language("hi")
//!         .session("session-1")
//!         .build();
//!
//!     let result = gateway.generate(&request).await?;
//!     println!("{}", result.question().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod normalize;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod telemetry;
pub mod templates;
pub mod traits;
pub mod types;
mod version;

// Re-export main types at crate root
pub use cache::{BoundedCache, CacheConfig, CacheStats};
pub use config::{MimirConfig, Secrets};
pub use error::{MimirError, Result};
pub use gateway::{Gateway, Mimir, MimirBuilder, ProviderRouter};
pub use normalize::{ParseError, ResponseNormalizer};
pub use providers::{Provider, RetryExecutor, RetryPolicy};
pub use session::{SessionGateState, SessionProgressGate, SessionStatus};
pub use templates::TemplateTable;
pub use traits::ContentGateway;
pub use version::{GIT_BRANCH, GIT_SHA, PKG_VERSION, git_dirty, version_string};

// Re-export all types
pub use types::{
    CACHE_SOURCE, GenerationKind, GenerationRequest, GenerationRequestBuilder, InvokeRequest,
    Message, NormalizedResult, ProviderDescriptor, RawCompletion, Role, TEMPLATE_SOURCE,
};
