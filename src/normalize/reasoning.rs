//! Removal of reasoning ("thinking") blocks leaked into completions.

use std::sync::LazyLock;

use regex::Regex;

static CLOSED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<think>.*?</think>|<thinking>.*?</thinking>|<reasoning>.*?</reasoning>",
    )
    .expect("static regex")
});

static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<(?:think|thinking|reasoning)>").expect("static regex"));

static CLOSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(?:think|thinking|reasoning)>").expect("static regex"));

/// Strip reasoning delimiters and their content.
///
/// - complete `<think>…</think>` (also `thinking`, `reasoning`) blocks are removed
/// - an orphan closing tag drops everything before it
/// - an unclosed opening tag drops everything after it
pub fn strip_reasoning(text: &str) -> String {
    let without_blocks = CLOSED_BLOCK.replace_all(text, "");
    let mut rest: &str = &without_blocks;

    if let Some(close) = CLOSE_TAG.find_iter(rest).last() {
        rest = &rest[close.end()..];
    }
    if let Some(open) = OPEN_TAG.find(rest) {
        rest = &rest[..open.start()];
    }

    rest.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_complete_block() {
        let text = "<think>The user wants a question.</think>\nWhat is your biggest strength?";
        assert_eq!(strip_reasoning(text), "What is your biggest strength?");
    }

    #[test]
    fn removes_multiple_blocks_and_variants() {
        let text = "<THINK>a</THINK>Hello <reasoning>b\nc</reasoning>world";
        assert_eq!(strip_reasoning(text), "Hello world");
    }

    #[test]
    fn orphan_close_tag_drops_prefix() {
        let text = "let me think about it...</think>Describe your last project.";
        assert_eq!(strip_reasoning(text), "Describe your last project.");
    }

    #[test]
    fn unclosed_open_tag_drops_suffix() {
        let text = "Why do you want this job?\n<thinking>maybe I should add";
        assert_eq!(strip_reasoning(text), "Why do you want this job?");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(strip_reasoning("  plain  "), "plain");
    }

    #[test]
    fn only_reasoning_yields_empty() {
        assert_eq!(strip_reasoning("<think>nothing else</think>"), "");
    }
}
