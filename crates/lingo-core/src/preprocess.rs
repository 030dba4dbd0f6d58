use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

/// Longest stored word key, in chars
pub const MAX_WORD_CHARS: usize = 200;

/// Longest stored sentence, in chars
pub const MAX_SENTENCE_CHARS: usize = 500;

pub trait Preprocessor {
    // Default capture preprocessor
    fn process(&self, text: &str) -> String {
        let text = text.trim();

        if text.is_empty() {
            return String::new();
        }

        // NFC plus width folding only; compatibility forms such as `…` stay as typed
        let text: String = text.nfc().map(fold_width).collect();

        // Selections spanning several frames arrive line by line, often repeated
        let mut seen = HashSet::new();
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .filter(|line| seen.insert(*line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Map full-width ASCII forms and the ideographic space to plain ASCII
fn fold_width(c: char) -> char {
    match c {
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(c as u32 - 0xFEE0).unwrap_or(c),
        '\u{3000}' => ' ',
        _ => c,
    }
}

pub struct DefaultPreprocessor;
impl Preprocessor for DefaultPreprocessor {}

/// Normalized matching key: trimmed, lowercased, capped at [`MAX_WORD_CHARS`]
pub fn normalize_word(text: &str) -> String {
    truncate_chars(&text.trim().to_lowercase(), MAX_WORD_CHARS)
}

/// Case and surrounding-whitespace insensitive key for sentences
pub fn sentence_key(sentence: &str) -> String {
    sentence.trim().to_lowercase()
}

pub fn same_sentence(a: &str, b: &str) -> bool {
    sentence_key(a) == sentence_key(b)
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
