//! Generation request types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{MimirError, Result};

/// What a generation request is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// The next interview question.
    Question,
    /// An interviewer persona.
    Persona,
    /// A STAR assessment of a candidate answer.
    Assessment,
    /// Translation of interview content into the target language.
    Translation,
}

impl GenerationKind {
    /// All kinds, in declaration order.
    pub const ALL: [GenerationKind; 4] = [
        GenerationKind::Question,
        GenerationKind::Persona,
        GenerationKind::Assessment,
        GenerationKind::Translation,
    ];

    /// Stable lowercase name, used in cache keys, metrics labels and config.
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Question => "question",
            GenerationKind::Persona => "persona",
            GenerationKind::Assessment => "assessment",
            GenerationKind::Translation => "translation",
        }
    }

    /// Prompt context keys a request of this kind must carry.
    pub fn required_context(self) -> &'static [&'static str] {
        match self {
            GenerationKind::Question | GenerationKind::Persona => &["role"],
            GenerationKind::Assessment => &["question", "answer"],
            GenerationKind::Translation => &["text"],
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationKind {
    type Err = MimirError;

    fn from_str(s: &str) -> Result<Self> {
        GenerationKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MimirError::InvalidRequest(format!("unknown generation kind '{s}'")))
    }
}

/// Default completion budget for a request.
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Default sampling temperature for a request.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A content-generation request, immutable once built.
///
/// ```rust
/// # use mimir::{GenerationKind, GenerationRequest};
/// let request = GenerationRequest::builder(GenerationKind::Question)
///     .context("role", "backend engineer")
///     .context("level", "senior")
///     .language("en")
///     .session("session-42")
///     .build();
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    kind: GenerationKind,
    prompt_context: BTreeMap<String, String>,
    target_language: String,
    session_id: String,
    max_tokens: u32,
    temperature: f32,
}

impl GenerationRequest {
    /// Start building a request of the given kind.
    pub fn builder(kind: GenerationKind) -> GenerationRequestBuilder {
        GenerationRequestBuilder::new(kind)
    }

    pub fn kind(&self) -> GenerationKind {
        self.kind
    }

    /// Prompt context, ordered by key.
    pub fn prompt_context(&self) -> &BTreeMap<String, String> {
        &self.prompt_context
    }

    /// Look up a single prompt context value.
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.prompt_context.get(key).map(String::as_str)
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Check the request shape.
    ///
    /// Failures here are caller bugs, not operational conditions, and are the
    /// only errors `generate` propagates.
    pub fn validate(&self) -> Result<()> {
        if self.session_id.trim().is_empty() {
            return Err(MimirError::InvalidRequest("session id is empty".into()));
        }
        if self.target_language.trim().is_empty() {
            return Err(MimirError::InvalidRequest("target language is empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(MimirError::InvalidRequest("max_tokens must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(MimirError::InvalidRequest(format!(
                "temperature {} outside [0.0, 2.0]",
                self.temperature
            )));
        }
        for field in self.kind.required_context() {
            let present = self
                .prompt_context
                .get(*field)
                .is_some_and(|v| !v.trim().is_empty());
            if !present {
                return Err(MimirError::MissingPromptField {
                    kind: self.kind.as_str(),
                    field,
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct GenerationRequestBuilder {
    kind: GenerationKind,
    prompt_context: BTreeMap<String, String>,
    target_language: String,
    session_id: String,
    max_tokens: u32,
    temperature: f32,
}

impl GenerationRequestBuilder {
    fn new(kind: GenerationKind) -> Self {
        Self {
            kind,
            prompt_context: BTreeMap::new(),
            target_language: "en".to_string(),
            session_id: String::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Add one prompt context entry (later values overwrite earlier ones).
    pub fn context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.prompt_context.insert(key.into(), value.into());
        self
    }

    /// Set the target language code (default: `en`).
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.target_language = language.into();
        self
    }

    /// Set the logical session the request belongs to.
    pub fn session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Set the completion budget.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Freeze the request. Shape is checked later by [`GenerationRequest::validate`].
    pub fn build(self) -> GenerationRequest {
        GenerationRequest {
            kind: self.kind,
            prompt_context: self.prompt_context,
            target_language: self.target_language.trim().to_lowercase(),
            session_id: self.session_id,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}
