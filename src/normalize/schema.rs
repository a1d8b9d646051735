//! Per-kind result schemas.
//!
//! | kind        | required                      | optional (default)                                   |
//! |-------------|-------------------------------|------------------------------------------------------|
//! | question    | `question`                    | `category` ("general"), `difficulty` ("medium")      |
//! | persona     | `name`, `role`                | `company` (""), `style` ("professional"), `background` ("") |
//! | assessment  | `score` (number), `feedback`  | `situation` `task` `action` `result` (0), `strengths` `improvements` ([]) |
//! | translation | `translation`                 | `source_language` ("")                               |
//!
//! Conforming produces a fresh object holding exactly the schema's fields.
//! Numbers sent as numeric strings are accepted; optional fields of the wrong
//! shape fall back to their default.

use serde_json::{Map, Number, Value};

use super::ParseError;
use super::question::{clean_question, ensure_terminal};
use crate::types::GenerationKind;

enum Field {
    Text(&'static str),
    Number(&'static str),
    OptText(&'static str, &'static str),
    OptNumber(&'static str),
    TextList(&'static str),
}

const QUESTION: &[Field] = &[
    Field::Text("question"),
    Field::OptText("category", "general"),
    Field::OptText("difficulty", "medium"),
];

const PERSONA: &[Field] = &[
    Field::Text("name"),
    Field::Text("role"),
    Field::OptText("company", ""),
    Field::OptText("style", "professional"),
    Field::OptText("background", ""),
];

const ASSESSMENT: &[Field] = &[
    Field::Number("score"),
    Field::Text("feedback"),
    Field::OptNumber("situation"),
    Field::OptNumber("task"),
    Field::OptNumber("action"),
    Field::OptNumber("result"),
    Field::TextList("strengths"),
    Field::TextList("improvements"),
];

const TRANSLATION: &[Field] = &[
    Field::Text("translation"),
    Field::OptText("source_language", ""),
];

fn fields_for(kind: GenerationKind) -> &'static [Field] {
    match kind {
        GenerationKind::Question => QUESTION,
        GenerationKind::Persona => PERSONA,
        GenerationKind::Assessment => ASSESSMENT,
        GenerationKind::Translation => TRANSLATION,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let parsed: f64 = s.trim().parse().ok()?;
            Number::from_f64(parsed)
        }
        _ => None,
    }
}

fn as_text_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(as_text)
            .filter(|s| !s.is_empty())
            .map(Value::String)
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![Value::String(s.trim().to_string())],
        _ => Vec::new(),
    }
}

/// Validate `object` against the schema for `kind` and fill defaults.
///
/// Question text is cleaned and given terminal punctuation for `language`.
pub fn conform(
    kind: GenerationKind,
    object: Map<String, Value>,
    language: &str,
) -> Result<Map<String, Value>, ParseError> {
    let mut out = Map::new();

    for field in fields_for(kind) {
        match *field {
            Field::Text(name) => {
                let value = object.get(name).ok_or(ParseError::MissingField(name))?;
                let text = match value {
                    Value::String(s) => s.trim().to_string(),
                    Value::Null => return Err(ParseError::MissingField(name)),
                    _ => {
                        return Err(ParseError::WrongType {
                            field: name,
                            expected: "a string",
                        });
                    }
                };
                if text.is_empty() {
                    return Err(ParseError::MissingField(name));
                }
                out.insert(name.to_string(), Value::String(text));
            }
            Field::Number(name) => {
                let value = object.get(name).ok_or(ParseError::MissingField(name))?;
                if value.is_null() {
                    return Err(ParseError::MissingField(name));
                }
                let number = as_number(value).ok_or(ParseError::WrongType {
                    field: name,
                    expected: "a number",
                })?;
                out.insert(name.to_string(), Value::Number(number));
            }
            Field::OptText(name, default) => {
                let text = object
                    .get(name)
                    .and_then(as_text)
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| default.to_string());
                out.insert(name.to_string(), Value::String(text));
            }
            Field::OptNumber(name) => {
                let number = object
                    .get(name)
                    .and_then(as_number)
                    .unwrap_or_else(|| Number::from(0));
                out.insert(name.to_string(), Value::Number(number));
            }
            Field::TextList(name) => {
                let items = object.get(name).map(as_text_list).unwrap_or_default();
                out.insert(name.to_string(), Value::Array(items));
            }
        }
    }

    if kind == GenerationKind::Question {
        let raw = out.get("question").and_then(Value::as_str).unwrap_or_default();
        let cleaned = clean_question(raw);
        if cleaned.is_empty() {
            return Err(ParseError::MissingField("question"));
        }
        out.insert(
            "question".to_string(),
            Value::String(ensure_terminal(&cleaned, language)),
        );
    }

    Ok(out)
}

/// Names of the fields every result of `kind` carries.
pub fn field_names(kind: GenerationKind) -> Vec<&'static str> {
    fields_for(kind)
        .iter()
        .map(|f| match *f {
            Field::Text(n)
            | Field::Number(n)
            | Field::OptText(n, _)
            | Field::OptNumber(n)
            | Field::TextList(n) => n,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn persona_defaults_are_filled() {
        let out = conform(
            GenerationKind::Persona,
            object(json!({"name": "Priya", "role": "Engineering Manager", "extra": 1})),
            "en",
        )
        .unwrap();
        assert_eq!(out["style"], "professional");
        assert_eq!(out["company"], "");
        assert!(!out.contains_key("extra"));
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let out = conform(
            GenerationKind::Assessment,
            object(json!({"score": "8.5", "feedback": "good", "task": "3"})),
            "en",
        )
        .unwrap();
        assert_eq!(out["score"].as_f64(), Some(8.5));
        assert_eq!(out["task"].as_f64(), Some(3.0));
    }

    #[test]
    fn non_numeric_score_is_wrong_type() {
        let err = conform(
            GenerationKind::Assessment,
            object(json!({"score": "great", "feedback": "good"})),
            "en",
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParseError::WrongType {
                field: "score",
                expected: "a number"
            }
        );
    }

    #[test]
    fn blank_required_text_is_missing() {
        let err = conform(
            GenerationKind::Translation,
            object(json!({"translation": "  "})),
            "hi",
        )
        .unwrap_err();
        assert_eq!(err, ParseError::MissingField("translation"));
    }

    #[test]
    fn required_text_of_wrong_type() {
        let err = conform(
            GenerationKind::Persona,
            object(json!({"name": ["a"], "role": "x"})),
            "en",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::WrongType { field: "name", .. }));
    }

    #[test]
    fn string_lists_are_tolerant() {
        let out = conform(
            GenerationKind::Assessment,
            object(json!({
                "score": 6,
                "feedback": "ok",
                "strengths": ["clarity", 3, null, ""],
                "improvements": "add metrics"
            })),
            "en",
        )
        .unwrap();
        assert_eq!(out["strengths"], json!(["clarity", "3"]));
        assert_eq!(out["improvements"], json!(["add metrics"]));
    }

    #[test]
    fn question_is_cleaned_and_terminated() {
        let out = conform(
            GenerationKind::Question,
            object(json!({"question": "**Q:** describe a time you failed", "difficulty": "hard"})),
            "en",
        )
        .unwrap();
        assert_eq!(out["question"], "describe a time you failed.");
        assert_eq!(out["difficulty"], "hard");
    }

    #[test]
    fn field_names_follow_schema_order() {
        assert_eq!(
            field_names(GenerationKind::Translation),
            ["translation", "source_language"]
        );
    }
}
