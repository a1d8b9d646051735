//! Balanced-brace JSON object extraction from free text.
//!
//! Candidate objects are found in one pass over the text, so brace-heavy
//! completions cost linear time. At most `MAX_PARSE_ATTEMPTS` candidates
//! are handed to `serde_json`, largest first; smaller objects beyond that
//! are not considered.

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::ParseError;

/// Upper bound on candidates parsed per completion.
const MAX_PARSE_ATTEMPTS: usize = 64;

/// All distinct balanced object substrings, largest first.
///
/// String literals and escapes are honoured inside an open object. A `{`
/// that never closes contributes nothing but does not hide the objects
/// nested after it.
pub(crate) fn object_candidates(text: &str) -> Vec<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    // structural bytes are ASCII, so every span lands on char boundaries
    for (idx, byte) in text.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(idx),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, idx + 1));
                }
            }
            _ => {}
        }
    }

    // earlier candidates first among equal lengths
    spans.sort_unstable_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)).then(a.0.cmp(&b.0)));

    let mut seen = HashSet::new();
    spans
        .into_iter()
        .map(|(start, end)| &text[start..end])
        .filter(|candidate| seen.insert(*candidate))
        .collect()
}

/// Parse the largest balanced object that `conform` accepts.
///
/// Candidates are tried largest first; the error from the largest candidate
/// that parsed as an object is reported when none conforms.
pub(crate) fn extract_object<F>(text: &str, conform: F) -> Result<Map<String, Value>, ParseError>
where
    F: Fn(Map<String, Value>) -> Result<Map<String, Value>, ParseError>,
{
    let mut first_err = None;
    for candidate in object_candidates(text).into_iter().take(MAX_PARSE_ATTEMPTS) {
        let Ok(Value::Object(object)) = serde_json::from_str::<Value>(candidate) else {
            continue;
        };
        match conform(object) {
            Ok(fields) => return Ok(fields),
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    Err(first_err.unwrap_or(ParseError::NoStructuredData))
}
