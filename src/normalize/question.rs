//! Heuristic extraction of a single interview question from free text.
//!
//! Used when a `Question` completion carries no usable JSON. Candidates are
//! considered in this order, first match wins:
//!
//! 1. a quoted sentence containing a question mark
//! 2. a quoted sentence, then any sentence, opening with a known
//!    interrogative starter for the target language
//! 3. any sentence containing a question mark
//! 4. the longest sentence-like line
//!
//! Whatever is chosen is cleaned and forced to end in terminal punctuation.

use std::sync::LazyLock;

use regex::Regex;

/// Characters accepted as sentence-terminal punctuation.
pub const TERMINALS: [char; 6] = ['.', '?', '!', '।', '？', '。'];

const QUESTION_MARKS: [char; 2] = ['?', '？'];

/// Shortest line (in chars) the longest-line fallback will accept.
const MIN_LINE_CHARS: usize = 12;

static QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"\n]{3,})"|“([^”\n]{3,})”|«([^»\n]{3,})»"#).expect("static regex")
});

static LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:next\s+question|question|interviewer|q)\s*\d*\s*[:：\-]\s*")
        .expect("static regex")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•>#]+|\d+[.)])\s*").expect("static regex"));

const EN_STARTERS: &[&str] = &[
    "what", "how", "why", "when", "where", "which", "who", "whom", "whose", "can you",
    "could you", "would you", "will you", "have you", "do you", "did you", "are you",
    "is there", "tell me", "describe", "walk me through", "explain", "share", "give me",
];

const HI_STARTERS: &[&str] = &[
    "क्या", "कैसे", "क्यों", "कब", "कहाँ", "कहां", "कौन", "कौनसा", "किस", "बताइए", "बताएं",
    "बताइये", "समझाइए", "वर्णन",
];

const ES_STARTERS: &[&str] = &[
    "¿", "qué", "cómo", "por qué", "cuándo", "dónde", "cuál", "quién", "puede", "podría",
    "cuéntame", "cuénteme", "describe", "describa", "explica", "explique",
];

const FR_STARTERS: &[&str] = &[
    "qu'est-ce", "que", "quel", "quelle", "comment", "pourquoi", "quand", "où", "qui",
    "pouvez-vous", "parlez-moi", "décrivez", "expliquez", "avez-vous",
];

const DE_STARTERS: &[&str] = &[
    "was", "wie", "warum", "wann", "wo", "welche", "welcher", "welches", "wer", "können sie",
    "erzählen sie", "beschreiben sie", "erklären sie", "haben sie",
];

/// Starters that open an imperative prompt rather than a question.
const IMPERATIVE_STARTERS: &[&str] = &[
    "tell me", "describe", "walk me through", "explain", "share", "give me", "बताइए",
    "बताएं", "बताइये", "समझाइए", "वर्णन", "cuéntame", "cuénteme", "describa", "explica",
    "explique", "parlez-moi", "décrivez", "expliquez", "erzählen sie", "beschreiben sie",
    "erklären sie",
];

/// Known interrogative starters for a language; unknown languages use English.
pub fn starters(language: &str) -> &'static [&'static str] {
    match language {
        "hi" => HI_STARTERS,
        "es" => ES_STARTERS,
        "fr" => FR_STARTERS,
        "de" => DE_STARTERS,
        _ => EN_STARTERS,
    }
}

fn starts_with_word(text: &str, prefix: &str) -> bool {
    let Some(rest) = text.strip_prefix(prefix) else {
        return false;
    };
    // "¿" is punctuation, anything may follow it
    !prefix.chars().last().is_some_and(char::is_alphanumeric)
        || rest.chars().next().is_none_or(|c| !c.is_alphanumeric())
}

fn opens_with_any(text: &str, prefixes: &[&str]) -> bool {
    let lower = text.to_lowercase();
    prefixes.iter().any(|p| starts_with_word(&lower, p))
}

fn is_question_like(text: &str, language: &str) -> bool {
    opens_with_any(text, starters(language)) || opens_with_any(text, EN_STARTERS)
}

fn has_question_mark(text: &str) -> bool {
    text.contains(QUESTION_MARKS)
}

/// Remove list markers, labels, markdown emphasis and wrapping quotes, and
/// collapse whitespace.
pub fn clean_question(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut current = collapsed.replace("**", "").replace("__", "").replace('`', "");

    loop {
        let before = current.clone();
        let trimmed = current.trim();
        let trimmed = LIST_MARKER.replace(trimmed, "");
        let trimmed = LABEL.replace(&trimmed, "");
        let trimmed = trimmed
            .trim()
            .trim_matches(|c| matches!(c, '"' | '“' | '”' | '«' | '»' | '\''))
            .trim();
        current = trimmed.to_string();
        if current == before {
            return current;
        }
    }
}

/// Guarantee the text ends in sentence-terminal punctuation.
///
/// Imperative prompts ("Tell me about…") get a full stop, everything else a
/// question mark.
pub fn ensure_terminal(text: &str, language: &str) -> String {
    let trimmed = text.trim_end_matches([':', ';', ',', ' ', '-', '–']);
    if trimmed.ends_with(TERMINALS) {
        return trimmed.to_string();
    }
    let imperative = opens_with_any(trimmed, IMPERATIVE_STARTERS);
    let mark = match (imperative, language) {
        (true, "hi") => '।',
        (true, _) => '.',
        (false, _) => '?',
    };
    format!("{trimmed}{mark}")
}

/// Split a line into sentences, keeping terminal punctuation attached.
fn sentences(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if !TERMINALS.contains(&ch) {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = idx + ch.len_utf8();
            let sentence = line[start..end].trim();
            if !sentence.is_empty() {
                out.push(sentence);
            }
            start = end;
        }
    }
    let tail = line[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

fn quoted_segments(text: &str) -> Vec<&str> {
    QUOTED
        .captures_iter(text)
        .filter_map(|caps| caps.iter().skip(1).flatten().next().map(|m| m.as_str().trim()))
        .filter(|s| !s.is_empty())
        .collect()
}

fn finish(candidate: &str, language: &str) -> Option<String> {
    let cleaned = clean_question(candidate);
    if cleaned.chars().any(char::is_alphanumeric) {
        Some(ensure_terminal(&cleaned, language))
    } else {
        None
    }
}

/// Extract one clean question from free text, or `None` if nothing usable.
pub fn extract_question(text: &str, language: &str) -> Option<String> {
    let quoted = quoted_segments(text);

    if let Some(q) = quoted.iter().find(|q| has_question_mark(q))
        && let Some(done) = finish(q, language)
    {
        return Some(done);
    }

    let lines: Vec<String> = text
        .lines()
        .map(clean_question)
        .filter(|l| !l.is_empty())
        .collect();
    let line_sentences: Vec<&str> = lines.iter().flat_map(|l| sentences(l)).collect();

    let starter_match = quoted
        .iter()
        .copied()
        .chain(line_sentences.iter().copied())
        .find(|s| is_question_like(&clean_question(s), language));
    if let Some(s) = starter_match
        && let Some(done) = finish(s, language)
    {
        return Some(done);
    }

    if let Some(s) = line_sentences.iter().find(|s| has_question_mark(s))
        && let Some(done) = finish(s, language)
    {
        return Some(done);
    }

    lines
        .iter()
        .filter(|l| l.chars().count() >= MIN_LINE_CHARS && l.chars().any(char::is_alphabetic))
        .fold(None::<&String>, |best, line| match best {
            Some(b) if b.chars().count() >= line.chars().count() => Some(b),
            _ => Some(line),
        })
        .and_then(|line| finish(line, language))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_sentence_with_imperative_starter() {
        let text = "\"Tell me about a challenge you solved.\" This is a good behavioral question.";
        assert_eq!(
            extract_question(text, "en").as_deref(),
            Some("Tell me about a challenge you solved.")
        );
    }

    #[test]
    fn quoted_question_mark_wins() {
        let text = "Here's one for a PM: \"What motivates you at work?\" Ask it warmly.";
        assert_eq!(
            extract_question(text, "en").as_deref(),
            Some("What motivates you at work?")
        );
    }

    #[test]
    fn curly_quotes_are_recognised() {
        let text = "Try this: “How do you prioritise competing deadlines?”";
        assert_eq!(
            extract_question(text, "en").as_deref(),
            Some("How do you prioritise competing deadlines?")
        );
    }

    #[test]
    fn labelled_line_with_starter() {
        let text = "Great choice.\n**Question 2:** Why did you leave your previous role";
        assert_eq!(
            extract_question(text, "en").as_deref(),
            Some("Why did you leave your previous role?")
        );
    }

    #[test]
    fn sentence_with_question_mark_without_starter() {
        let text = "Thanks for sharing.\nIn your last project, what went wrong?";
        // "In your last project, what went wrong?" has no starter but a '?'
        assert_eq!(
            extract_question(text, "en").as_deref(),
            Some("In your last project, what went wrong?")
        );
    }

    #[test]
    fn hindi_starter_is_matched() {
        let text = "अच्छा।\nक्या आपने कभी टीम का नेतृत्व किया है";
        assert_eq!(
            extract_question(text, "hi").as_deref(),
            Some("क्या आपने कभी टीम का नेतृत्व किया है?")
        );
    }

    #[test]
    fn longest_line_fallback_gets_terminal_punctuation() {
        let text = "ok\nYour approach to mentoring junior engineers\nfine";
        assert_eq!(
            extract_question(text, "en").as_deref(),
            Some("Your approach to mentoring junior engineers?")
        );
    }

    #[test]
    fn nothing_usable_yields_none() {
        assert_eq!(extract_question("ok\n--\n", "en"), None);
    }

    #[test]
    fn starter_requires_word_boundary() {
        assert!(!is_question_like("whatever happens next", "en"));
        assert!(is_question_like("What happens next", "en"));
    }

    #[test]
    fn spanish_inverted_mark_counts_as_starter() {
        assert!(is_question_like("¿Por qué quieres este puesto?", "es"));
    }

    #[test]
    fn clean_strips_markers_labels_and_quotes() {
        assert_eq!(clean_question("1. Q: \"Why us?\""), "Why us?");
        assert_eq!(clean_question("- **Question:**  Why   us?"), "Why us?");
        assert_eq!(clean_question("# Interviewer - Describe a failure"), "Describe a failure");
    }

    #[test]
    fn ensure_terminal_variants() {
        assert_eq!(ensure_terminal("Why us", "en"), "Why us?");
        assert_eq!(ensure_terminal("Describe a failure:", "en"), "Describe a failure.");
        assert_eq!(ensure_terminal("Why us?", "en"), "Why us?");
        assert_eq!(ensure_terminal("बताइए अपने बारे में", "hi"), "बताइए अपने बारे में।");
    }

    #[test]
    fn sentences_split_on_terminals() {
        assert_eq!(
            sentences("One. Two? Three! tail"),
            ["One.", "Two?", "Three!", "tail"]
        );
        assert_eq!(sentences("v1.2 is out."), ["v1.2 is out."]);
    }
}
