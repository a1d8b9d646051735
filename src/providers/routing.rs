//! Deterministic fallback ordering.
//!
//! [`rank_providers`] yields the provider order for one
//! `(kind, target_language)` pair. Providers that are unavailable, or that do
//! not support the kind or the target language, are dropped. The rest are
//! sorted by:
//!
//! 1. language tier: native (explicitly lists the target language) before
//!    general purpose (no language list) before default-only (supports just
//!    the default/source language)
//! 2. configured priority, lowest first
//! 3. registration order
//!
//! The sort key is total, so identical inputs always yield the same order.

use crate::types::{GenerationKind, ProviderDescriptor};

/// How well a provider's language support fits a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LanguageTier {
    /// Lists the target language explicitly.
    Native,
    /// Accepts any language.
    General,
    /// Supports only the default/source language.
    DefaultOnly,
}

/// Classify a provider for a target language, or `None` if it cannot serve it.
pub fn language_tier(
    descriptor: &ProviderDescriptor,
    target_language: &str,
    default_language: &str,
) -> Option<LanguageTier> {
    if !descriptor.supports_language(target_language) {
        return None;
    }
    if descriptor.is_general_purpose() {
        return Some(LanguageTier::General);
    }
    let default_only = descriptor.supported_languages.len() == 1
        && descriptor.supported_languages.contains(default_language);
    if default_only {
        Some(LanguageTier::DefaultOnly)
    } else {
        Some(LanguageTier::Native)
    }
}

/// Return the indices of `descriptors` in fallback order for a request.
pub fn rank_providers<'a, I>(
    descriptors: I,
    kind: GenerationKind,
    target_language: &str,
    default_language: &str,
) -> Vec<usize>
where
    I: IntoIterator<Item = &'a ProviderDescriptor>,
{
    let mut ranked: Vec<(LanguageTier, i32, usize)> = descriptors
        .into_iter()
        .enumerate()
        .filter(|(_, d)| d.is_available && d.supports_kind(kind))
        .filter_map(|(idx, d)| {
            language_tier(d, target_language, default_language).map(|tier| (tier, d.priority, idx))
        })
        .collect();
    ranked.sort_unstable();
    ranked.into_iter().map(|(_, _, idx)| idx).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(descriptors: &[ProviderDescriptor], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| descriptors[i].name.clone()).collect()
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    #[test]
    fn native_ranks_above_general_above_default_only() {
        let descriptors = vec![
            ProviderDescriptor::new("english-only", 0).languages(["en"]),
            ProviderDescriptor::new("general", 0),
            ProviderDescriptor::new("indic", 5).languages(["hi", "ta", "en"]),
        ];
        let order = rank_providers(&descriptors, GenerationKind::Question, "en", "en");
        assert_eq!(names(&descriptors, &order), ["indic", "general", "english-only"]);
    }

    #[test]
    fn unsupported_language_is_dropped() {
        let descriptors = vec![
            ProviderDescriptor::new("english-only", 0).languages(["en"]),
            ProviderDescriptor::new("general", 1),
        ];
        let order = rank_providers(&descriptors, GenerationKind::Question, "hi", "en");
        assert_eq!(names(&descriptors, &order), ["general"]);
    }

    #[test]
    fn priority_breaks_ties_within_tier() {
        let descriptors = vec![
            ProviderDescriptor::new("b", 2),
            ProviderDescriptor::new("a", 1),
            ProviderDescriptor::new("c", 2),
        ];
        let order = rank_providers(&descriptors, GenerationKind::Persona, "fr", "en");
        assert_eq!(names(&descriptors, &order), ["a", "b", "c"]);
    }

    #[test]
    fn unavailable_and_wrong_kind_are_dropped() {
        let descriptors = vec![
            ProviderDescriptor::new("down", 0).available(false),
            ProviderDescriptor::new("translator", 0).kinds([GenerationKind::Translation]),
            ProviderDescriptor::new("general", 9),
        ];
        let order = rank_providers(&descriptors, GenerationKind::Question, "en", "en");
        assert_eq!(names(&descriptors, &order), ["general"]);
    }

    #[test]
    fn ordering_is_deterministic() {
        let descriptors = vec![
            ProviderDescriptor::new("x", 1),
            ProviderDescriptor::new("y", 1),
            ProviderDescriptor::new("z", 0).languages(["de"]),
        ];
        let first = rank_providers(&descriptors, GenerationKind::Assessment, "de", "en");
        for _ in 0..10 {
            assert_eq!(
                rank_providers(&descriptors, GenerationKind::Assessment, "de", "en"),
                first
            );
        }
        assert_eq!(names(&descriptors, &first), ["z", "x", "y"]);
    }
}
