//! Client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Many domain-specific providers (native-language models, self-hosted
//! inference servers) expose this wire shape. Errors are mapped so the retry
//! executor can classify them:
//!
//! | status        | error                      | retried |
//! |---------------|----------------------------|---------|
//! | 401, 403      | `AuthenticationFailed`     | no      |
//! | 402           | `QuotaExceeded`            | no      |
//! | 429           | `RateLimited` (+ hint)     | yes     |
//! | 408, 5xx      | `Api`                      | yes     |
//! | other 4xx     | `Api`                      | no      |

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::traits::Provider;
use crate::types::{InvokeRequest, ProviderDescriptor};
use crate::{MimirError, Result};

/// Provider speaking the OpenAI chat completions protocol.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    descriptor: ProviderDescriptor,
    base_url: String,
    model: String,
    api_key: Option<String>,
    http: Client,
}

impl OpenAiCompatibleProvider {
    /// Create a provider for `{base_url}/chat/completions`.
    pub fn new(
        descriptor: ProviderDescriptor,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_http_client(descriptor, base_url, model, Client::new())
    }

    /// Create a provider sharing an existing connection pool.
    pub fn with_http_client(
        descriptor: ProviderDescriptor,
        base_url: impl Into<String>,
        model: impl Into<String>,
        http: Client,
    ) -> Self {
        Self {
            descriptor,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            http,
        }
    }

    /// Set the bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn check_status(response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 | 403 => Err(MimirError::AuthenticationFailed),
            402 => Err(MimirError::QuotaExceeded(status.to_string())),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(MimirError::RateLimited { retry_after })
            }
            code => Err(MimirError::Api {
                status: code,
                message: format!("chat completions error: {status}"),
            }),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    #[instrument(name = "openai_compat.invoke", skip(self, request), fields(provider = %self.descriptor.name, model = %self.model))]
    async fn invoke(&self, request: &InvokeRequest) -> Result<String> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(WireMessage {
                role: "system",
                content: &request.system_prompt,
            });
        }
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role.as_str(),
            content: &m.content,
        }));

        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut call = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(ref key) = self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call.send().await.map_err(|e| {
            if e.is_timeout() {
                MimirError::Timeout(Duration::ZERO)
            } else {
                MimirError::Http(e.to_string())
            }
        })?;

        Self::check_status(&response)?;

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| MimirError::Http(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(MimirError::EmptyResponse)
    }
}
