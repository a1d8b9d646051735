//! Provider abstraction, transports, retry and fallback ordering.
//!
//! - [`traits`] — the uniform [`Provider`] capability trait
//! - [`retry`] — [`RetryPolicy`] and [`RetryExecutor`]
//! - [`routing`] — deterministic fallback ordering
//! - [`registry`] — the static [`ProviderRegistry`]
//! - [`llm_chat`], [`openai_compat`] — concrete transports

pub mod llm_chat;
pub mod openai_compat;
pub mod registry;
pub mod retry;
pub mod routing;
pub mod traits;

pub use llm_chat::{ChatBackend, LlmChatProvider};
pub use openai_compat::OpenAiCompatibleProvider;
pub use registry::ProviderRegistry;
pub use retry::{RetryExecutor, RetryPolicy};
pub use routing::{LanguageTier, language_tier, rank_providers};
pub use traits::Provider;
