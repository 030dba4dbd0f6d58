use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// A letter, then letters, apostrophes or hyphens
static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z][A-Za-z'-]*").expect("token pattern is valid"));

static WORD_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z'-]{0,49}$").expect("word pattern is valid"));

/// Terminal punctuation, ASCII and CJK full-width
const SENTENCE_MARKS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Distinct tokens at which a selection counts as a sentence
pub const SENTENCE_TOKEN_THRESHOLD: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    /// A single word or a short phrase
    Word,
    Sentence,
}

/// Lowercase word tokens, deduplicated, in order of first occurrence
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Decide whether a trimmed, non-empty selection is a word or a sentence.
///
/// Punctuation always wins over the token count, so `"Really?"` is a
/// sentence.
pub fn classify(text: &str) -> TextKind {
    let text = text.trim();

    if text.contains(SENTENCE_MARKS) || tokenize(text).len() >= SENTENCE_TOKEN_THRESHOLD {
        TextKind::Sentence
    } else {
        TextKind::Word
    }
}

/// Strict single-word check: no whitespace, starts with a letter, at most
/// 50 chars of letters, hyphens and apostrophes.
pub fn is_word_candidate(text: &str) -> bool {
    let text = text.trim();
    !text.is_empty() && !text.contains(char::is_whitespace) && WORD_CANDIDATE.is_match(text)
}
