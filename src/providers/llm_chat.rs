//! llm crate wrapper implementing [`Provider`].
//!
//! [`LlmChatProvider`] stores backend configuration and builds an llm
//! provider per call, because the llm crate fixes the system prompt,
//! temperature and token budget at build time.

use async_trait::async_trait;
use llm::LLMProvider;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage as LlmMessage;
use serde::Deserialize;
use tracing::instrument;

use super::traits::Provider;
use crate::types::{InvokeRequest, Message, ProviderDescriptor, Role};
use crate::{MimirError, Result};

/// Chat backends reachable through the llm crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatBackend {
    OpenRouter,
    Anthropic,
    OpenAI,
    Google,
    Ollama,
}

impl ChatBackend {
    fn to_llm(self) -> LLMBackend {
        match self {
            ChatBackend::OpenRouter => LLMBackend::OpenRouter,
            ChatBackend::Anthropic => LLMBackend::Anthropic,
            ChatBackend::OpenAI => LLMBackend::OpenAI,
            ChatBackend::Google => LLMBackend::Google,
            ChatBackend::Ollama => LLMBackend::Ollama,
        }
    }

    /// Whether calls need an API key.
    pub fn requires_key(self) -> bool {
        !matches!(self, ChatBackend::Ollama)
    }
}

/// Provider backed by one llm crate backend and model.
///
/// ```ignore
/// use mimir::providers::{ChatBackend, LlmChatProvider};
/// use mimir::ProviderDescriptor;
///
/// let provider = LlmChatProvider::new(
///     ProviderDescriptor::new("gemini", 1),
///     ChatBackend::Google,
///     "gemini-2.0-flash",
/// )
/// .api_key("your-key");
/// ```
pub struct LlmChatProvider {
    descriptor: ProviderDescriptor,
    backend: ChatBackend,
    model: String,
    api_key: Option<String>,
    /// Base URL override (Ollama or self-hosted gateways)
    base_url: Option<String>,
    /// Transport-level timeout in seconds
    timeout_secs: u64,
}

impl LlmChatProvider {
    pub fn new(
        descriptor: ProviderDescriptor,
        backend: ChatBackend,
        model: impl Into<String>,
    ) -> Self {
        Self {
            descriptor,
            backend,
            model: model.into(),
            api_key: None,
            base_url: None,
            timeout_secs: 30,
        }
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the backend base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the transport timeout in seconds.
    ///
    /// The retry executor applies its own, usually shorter, per-attempt timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn build_provider(&self, request: &InvokeRequest) -> Result<Box<dyn LLMProvider>> {
        let mut builder = LLMBuilder::new()
            .backend(self.backend.to_llm())
            .model(&self.model)
            .timeout_seconds(self.timeout_secs)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens);

        if let Some(ref key) = self.api_key {
            builder = builder.api_key(key);
        } else if self.backend.requires_key() {
            return Err(MimirError::AuthenticationFailed);
        }

        if !request.system_prompt.is_empty() {
            builder = builder.system(&request.system_prompt);
        }

        if let Some(ref url) = self.base_url {
            builder = builder.base_url(url.clone());
        }

        builder.build().map_err(|e| MimirError::Llm(e.to_string()))
    }
}

fn to_llm_messages(messages: &[Message]) -> Vec<LlmMessage> {
    messages
        .iter()
        .map(|msg| match msg.role {
            Role::User => LlmMessage::user().content(msg.content.clone()).build(),
            Role::Assistant => LlmMessage::assistant().content(msg.content.clone()).build(),
        })
        .collect()
}

#[async_trait]
impl Provider for LlmChatProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[instrument(name = "llm.invoke", skip(self, request), fields(provider = %self.descriptor.name, model = %self.model))]
    async fn invoke(&self, request: &InvokeRequest) -> Result<String> {
        let provider = self.build_provider(request)?;
        let response = provider
            .chat(&to_llm_messages(&request.messages))
            .await
            .map_err(MimirError::from)?;
        response.text().ok_or(MimirError::EmptyResponse)
    }
}
