//! Tolerant parsing of raw completions into [`NormalizedResult`]s.
//!
//! Model output is untrusted, semi-structured text. The normalizer runs a
//! fixed strategy order and the first success wins:
//!
//! 1. strip reasoning blocks ([`reasoning::strip_reasoning`])
//! 2. structured extraction: the largest balanced `{...}` object that
//!    conforms to the kind's schema ([`schema::conform`])
//! 3. for [`GenerationKind::Question`] only, heuristic extraction of a single
//!    question from the free text ([`question::extract_question`])
//!
//! Failure is a typed [`ParseError`], never a panic. The router treats it
//! exactly like a provider failure and moves on.

pub mod json;
pub mod question;
pub mod reasoning;
pub mod schema;

use serde_json::{Map, Value};
use tracing::debug;

use crate::types::{GenerationKind, NormalizedResult, RawCompletion};

/// Why a completion could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("completion is empty after stripping reasoning")]
    Empty,

    #[error("no JSON object found")]
    NoStructuredData,

    #[error("required field '{0}' is missing")]
    MissingField(&'static str),

    #[error("field '{field}' should be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("no question found in free text")]
    NoQuestion,
}

/// Stateless multi-strategy parser for raw completions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseNormalizer;

impl ResponseNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a completion produced for a request of `kind` in `language`.
    ///
    /// The returned result always carries `kind` and the completion's
    /// provider name, with `used_fallback = false`.
    pub fn normalize(
        &self,
        raw: &RawCompletion,
        kind: GenerationKind,
        language: &str,
    ) -> Result<NormalizedResult, ParseError> {
        let fields = self.extract_fields(&raw.text, kind, language)?;
        Ok(NormalizedResult::from_provider(kind, fields, &raw.provider_name))
    }

    /// Run the strategy chain on bare text.
    pub fn extract_fields(
        &self,
        text: &str,
        kind: GenerationKind,
        language: &str,
    ) -> Result<Map<String, Value>, ParseError> {
        let visible = reasoning::strip_reasoning(text);
        if visible.is_empty() {
            return Err(ParseError::Empty);
        }

        let structured = json::extract_object(&visible, |object| {
            schema::conform(kind, object, language)
        });
        let err = match structured {
            Ok(fields) => return Ok(fields),
            Err(e) => e,
        };

        if kind != GenerationKind::Question {
            return Err(err);
        }

        debug!(error = %err, "structured extraction failed, trying question heuristics");
        let question =
            question::extract_question(&visible, language).ok_or(ParseError::NoQuestion)?;
        schema::conform(kind, question_object(question), language)
    }
}

fn question_object(question: String) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert("question".to_string(), Value::String(question));
    object
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawCompletion {
        RawCompletion {
            text: text.to_string(),
            provider_name: "primary".to_string(),
            latency_ms: 12,
        }
    }

    fn normalize(text: &str, kind: GenerationKind) -> Result<NormalizedResult, ParseError> {
        ResponseNormalizer::new().normalize(&raw(text), kind, "en")
    }

    #[test]
    fn reasoning_then_quoted_imperative() {
        let text = "<think>...</think>\n\"Tell me about a challenge you solved.\" This is a good behavioral question.";
        let result = normalize(text, GenerationKind::Question).unwrap();
        assert_eq!(result.question(), Some("Tell me about a challenge you solved."));
        assert_eq!(result.kind, GenerationKind::Question);
        assert_eq!(result.source_provider, "primary");
        assert!(!result.used_fallback);
    }

    #[test]
    fn structured_question_gets_defaults() {
        let result = normalize(
            r#"{"question": "What drew you to this role"}"#,
            GenerationKind::Question,
        )
        .unwrap();
        assert_eq!(result.question(), Some("What drew you to this role?"));
        assert_eq!(result.field_str("category"), Some("general"));
        assert_eq!(result.field_str("difficulty"), Some("medium"));
    }

    #[test]
    fn question_json_without_question_falls_back_to_heuristics() {
        let text = "{\"note\": \"n/a\"}\nHow do you handle conflicting priorities?";
        let result = normalize(text, GenerationKind::Question).unwrap();
        assert_eq!(
            result.question(),
            Some("How do you handle conflicting priorities?")
        );
    }

    #[test]
    fn assessment_in_fenced_json() {
        let text = "Here is my evaluation:\n```json\n{\"score\": 7, \"feedback\": \"Clear structure\", \"action\": 8}\n```";
        let result = normalize(text, GenerationKind::Assessment).unwrap();
        assert_eq!(result.field_f64("score"), Some(7.0));
        assert_eq!(result.field_f64("action"), Some(8.0));
        assert_eq!(result.field_f64("situation"), Some(0.0));
        assert_eq!(result.fields["strengths"], serde_json::json!([]));
    }

    #[test]
    fn non_question_kinds_have_no_heuristic() {
        let err = normalize("Sure, the persona is Priya.", GenerationKind::Persona).unwrap_err();
        assert_eq!(err, ParseError::NoStructuredData);
    }

    #[test]
    fn missing_required_field_is_reported() {
        let err = normalize(r#"{"feedback": "ok"}"#, GenerationKind::Assessment).unwrap_err();
        assert_eq!(err, ParseError::MissingField("score"));
    }

    #[test]
    fn reasoning_only_is_empty() {
        let err = normalize("<think>hmm</think>", GenerationKind::Question).unwrap_err();
        assert_eq!(err, ParseError::Empty);
    }

    #[test]
    fn unusable_question_text() {
        let err = normalize("ok", GenerationKind::Question).unwrap_err();
        assert_eq!(err, ParseError::NoQuestion);
    }
}
