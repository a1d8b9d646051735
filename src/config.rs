//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. explicit path (e.g. the CLI's `--config`)
//! 2. `~/.mimir/config.toml` (user)
//! 3. `/etc/mimir/config.toml` (system)
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.mimir/secrets.toml` (user, must be 0600)
//! 2. `/etc/mimir/secrets.toml` (system, must be 0600)
//!
//! A provider's key falls back to the `<NAME>_API_KEY` environment variable
//! (name upper-cased, `-` replaced by `_`), then to the variable of its llm
//! backend (e.g. `GOOGLE_API_KEY`).
//!
//! ```toml
//! [retry]
//! max_attempts = 4
//!
//! [router]
//! deadline_secs = 30
//!
//! [[providers]]
//! name = "sarvam"
//! kind = "openai-compatible"
//! base_url = "https://api.sarvam.ai/v1"
//! model = "sarvam-m"
//! languages = ["hi", "ta"]
//!
//! [[providers]]
//! name = "gemini"
//! kind = "llm"
//! backend = "google"
//! model = "gemini-2.0-flash"
//! priority = 1
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::cache::CacheConfig;
use crate::providers::{
    ChatBackend, LlmChatProvider, OpenAiCompatibleProvider, Provider, RetryPolicy,
};
use crate::session::DEFAULT_CALL_LIMIT;
use crate::types::{GenerationKind, ProviderDescriptor};
use crate::{MimirError, Result};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MimirConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheFileConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter_ms: default_jitter_ms(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_jitter_ms() -> u64 {
    1_000
}

fn default_attempt_timeout_secs() -> u64 {
    15
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .max_attempts(self.max_attempts)
            .base_delay(Duration::from_millis(self.base_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .jitter(Duration::from_millis(self.jitter_ms))
            .attempt_timeout(Duration::from_secs(self.attempt_timeout_secs))
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheFileConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_eviction_fraction")]
    pub eviction_fraction: f64,
    #[serde(default)]
    pub ttl: TtlConfig,
    #[serde(default = "default_fallback_ttl_secs")]
    pub fallback_ttl_secs: u64,
}

impl Default for CacheFileConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            eviction_fraction: default_eviction_fraction(),
            ttl: TtlConfig::default(),
            fallback_ttl_secs: default_fallback_ttl_secs(),
        }
    }
}

fn default_capacity() -> usize {
    crate::cache::bounded::DEFAULT_CAPACITY
}

fn default_eviction_fraction() -> f64 {
    crate::cache::bounded::DEFAULT_EVICTION_FRACTION
}

fn default_fallback_ttl_secs() -> u64 {
    30
}

/// `[cache.ttl]` section, seconds per kind.
#[derive(Debug, Clone, Deserialize)]
pub struct TtlConfig {
    #[serde(default = "default_question_ttl")]
    pub question: u64,
    #[serde(default = "default_persona_ttl")]
    pub persona: u64,
    #[serde(default = "default_assessment_ttl")]
    pub assessment: u64,
    #[serde(default = "default_translation_ttl")]
    pub translation: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            question: default_question_ttl(),
            persona: default_persona_ttl(),
            assessment: default_assessment_ttl(),
            translation: default_translation_ttl(),
        }
    }
}

fn default_question_ttl() -> u64 {
    600
}

fn default_persona_ttl() -> u64 {
    3_600
}

fn default_assessment_ttl() -> u64 {
    1_800
}

fn default_translation_ttl() -> u64 {
    86_400
}

impl CacheFileConfig {
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .capacity(self.capacity)
            .eviction_fraction(self.eviction_fraction)
            .ttl(GenerationKind::Question, Duration::from_secs(self.ttl.question))
            .ttl(GenerationKind::Persona, Duration::from_secs(self.ttl.persona))
            .ttl(GenerationKind::Assessment, Duration::from_secs(self.ttl.assessment))
            .ttl(GenerationKind::Translation, Duration::from_secs(self.ttl.translation))
            .fallback_ttl(Duration::from_secs(self.fallback_ttl_secs))
    }
}

/// `[gate]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_call_limit")]
    pub call_limit: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            call_limit: default_call_limit(),
        }
    }
}

fn default_call_limit() -> u32 {
    DEFAULT_CALL_LIMIT
}

/// `[router]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterConfig {
    /// Overall budget of one `generate` call (default: 40).
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    /// Source language of the application (default: "en").
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
            default_language: default_language(),
        }
    }
}

fn default_deadline_secs() -> u64 {
    40
}

fn default_language() -> String {
    "en".to_string()
}

/// Transport used by a configured provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// One of the llm crate backends.
    Llm,
    /// Any OpenAI-compatible `/chat/completions` endpoint.
    OpenaiCompatible,
}

/// One `[[providers]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: ProviderKind,
    /// Required for `kind = "llm"`.
    #[serde(default)]
    pub backend: Option<ChatBackend>,
    /// Required for `kind = "openai-compatible"`; optional override otherwise.
    #[serde(default)]
    pub base_url: Option<String>,
    pub model: String,
    /// Lower is tried first (default: 0).
    #[serde(default)]
    pub priority: i32,
    /// Empty means general purpose.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Empty means every kind.
    #[serde(default)]
    pub kinds: Vec<GenerationKind>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Whether the endpoint needs an API key (default: true, except for the
    /// ollama backend).
    #[serde(default)]
    pub requires_key: Option<bool>,
    /// Transport-level timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl ProviderConfig {
    fn needs_key(&self) -> bool {
        self.requires_key
            .unwrap_or_else(|| self.backend.is_none_or(ChatBackend::requires_key))
    }

    /// Build the provider. A provider that needs a key but has none is
    /// registered unavailable rather than rejected.
    pub fn build(&self, secrets: &Secrets) -> Result<Arc<dyn Provider>> {
        let api_key = secrets.api_key_for(&self.name, self.backend);
        let available = api_key.is_some() || !self.needs_key();
        if !available {
            warn!(provider = %self.name, "no API key found, provider registered as unavailable");
        }

        let descriptor = ProviderDescriptor::new(&self.name, self.priority)
            .languages(self.languages.iter().cloned())
            .kinds(self.kinds.iter().copied())
            .available(available);

        let provider: Arc<dyn Provider> = match self.kind {
            ProviderKind::Llm => {
                let backend = self.backend.ok_or_else(|| {
                    MimirError::Configuration(format!(
                        "provider '{}' of kind llm needs a backend",
                        self.name
                    ))
                })?;
                let mut provider = LlmChatProvider::new(descriptor, backend, &self.model);
                if let Some(key) = api_key {
                    provider = provider.api_key(key);
                }
                if let Some(ref url) = self.base_url {
                    provider = provider.base_url(url);
                }
                if let Some(secs) = self.timeout_secs {
                    provider = provider.timeout_secs(secs);
                }
                Arc::new(provider)
            }
            ProviderKind::OpenaiCompatible => {
                let base_url = self.base_url.as_deref().ok_or_else(|| {
                    MimirError::Configuration(format!(
                        "provider '{}' of kind openai-compatible needs a base_url",
                        self.name
                    ))
                })?;
                let mut builder = reqwest::Client::builder();
                if let Some(secs) = self.timeout_secs {
                    builder = builder.timeout(Duration::from_secs(secs));
                }
                let http = builder
                    .build()
                    .map_err(|e| MimirError::Configuration(format!("HTTP client: {e}")))?;
                let mut provider = OpenAiCompatibleProvider::with_http_client(
                    descriptor,
                    base_url,
                    &self.model,
                    http,
                );
                if let Some(key) = api_key {
                    provider = provider.api_key(key);
                }
                Arc::new(provider)
            }
        };
        Ok(provider)
    }
}

impl MimirConfig {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.mimir/config.toml`
    /// 3. `/etc/mimir/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        Self::load_from_file(&path)
    }

    /// Parse one config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MimirError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(MimirError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mimir").join("config.toml");
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/mimir/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }

        Err(MimirError::Configuration(
            "No config file found. Create ~/.mimir/config.toml or /etc/mimir/config.toml"
                .to_string(),
        ))
    }

    /// Enabled provider entries, in file order.
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(|p| p.enabled)
    }
}

/// Secrets configuration (API keys), one table per provider name.
///
/// ```toml
/// [sarvam]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Secrets {
    keys: HashMap<String, ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Environment variable holding the key of `provider`.
pub fn env_var_name(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase().replace('-', "_"))
}

fn backend_name(backend: ChatBackend) -> &'static str {
    match backend {
        ChatBackend::OpenRouter => "openrouter",
        ChatBackend::Anthropic => "anthropic",
        ChatBackend::OpenAI => "openai",
        ChatBackend::Google => "google",
        ChatBackend::Ollama => "ollama",
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.mimir/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/mimir/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (providers may use env vars).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".mimir").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/mimir/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        // No secrets file — return empty (providers can fall back to env vars)
        Ok(Secrets::default())
    }

    /// Load one secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MimirError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            MimirError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(MimirError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        // Permission check not available on non-Unix platforms
        Ok(())
    }

    /// Add a key programmatically.
    pub fn with_key(mut self, provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.keys.insert(
            provider.into(),
            ApiKeySecret {
                api_key: api_key.into(),
            },
        );
        self
    }

    /// Key stored in the secrets file for `provider`.
    pub fn file_key(&self, provider: &str) -> Option<&str> {
        self.keys.get(provider).map(|s| s.api_key.as_str())
    }

    /// Key for a configured provider, from the file or the environment.
    pub fn api_key_for(&self, provider: &str, backend: Option<ChatBackend>) -> Option<String> {
        self.resolve(provider, backend, |var| std::env::var(var).ok())
    }

    fn resolve<F>(&self, provider: &str, backend: Option<ChatBackend>, env: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = backend.map(backend_name);
        let mut names = vec![provider];
        names.extend(backend.filter(|b| *b != provider));

        names
            .iter()
            .find_map(|name| self.file_key(name).map(str::to_string))
            .or_else(|| names.iter().find_map(|name| env(&env_var_name(name))))
            .filter(|key| !key.trim().is_empty())
    }
}
