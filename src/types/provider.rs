//! Provider descriptors: static routing metadata for each provider.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::GenerationKind;

/// Read-only routing metadata for one provider.
///
/// An empty `supported_languages` set marks a general-purpose provider that
/// accepts any language; an empty `supported_kinds` set accepts every kind.
/// Lower `priority` values are tried first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub priority: i32,
    #[serde(default)]
    pub supported_languages: BTreeSet<String>,
    #[serde(default)]
    pub supported_kinds: BTreeSet<GenerationKind>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

fn default_available() -> bool {
    true
}

impl ProviderDescriptor {
    /// A general-purpose, available provider.
    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            supported_languages: BTreeSet::new(),
            supported_kinds: BTreeSet::new(),
            is_available: true,
        }
    }

    /// Restrict the provider to the given language codes.
    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_languages = languages
            .into_iter()
            .map(|l| l.into().trim().to_lowercase())
            .collect();
        self
    }

    /// Restrict the provider to the given generation kinds.
    pub fn kinds(mut self, kinds: impl IntoIterator<Item = GenerationKind>) -> Self {
        self.supported_kinds = kinds.into_iter().collect();
        self
    }

    /// Mark the provider available or not.
    pub fn available(mut self, available: bool) -> Self {
        self.is_available = available;
        self
    }

    /// Whether this provider accepts every language.
    pub fn is_general_purpose(&self) -> bool {
        self.supported_languages.is_empty()
    }

    pub fn supports_language(&self, language: &str) -> bool {
        self.is_general_purpose() || self.supported_languages.contains(language)
    }

    pub fn supports_kind(&self, kind: GenerationKind) -> bool {
        self.supported_kinds.is_empty() || self.supported_kinds.contains(&kind)
    }
}
