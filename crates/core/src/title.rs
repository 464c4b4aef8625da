//! Derives a concise conversation title from the first prompt. Consumers
//! persisting chats can use it whenever the current title is a placeholder.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::text::rune_len;

/// Unicode letters with optional trailing digits (keeps "gwi2025" intact).
static TITLE_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{L}+\p{N}*").expect("static regex"));

/// Minimal English stopword set for compact titles.
static TITLE_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "of", "to", "in", "is", "are", "for", "on", "with", "by",
        "from", "at", "as", "that", "this", "it", "be", "was", "were",
    ]
    .into_iter()
    .collect()
});

const MAX_TITLE_WORDS: usize = 8;
const DEFAULT_MAX_TITLE_RUNES: usize = 60;

/// Builds a title from the first eight non-stopword prompt tokens, each
/// Title-cased, clipped to `max_runes` (≤ 0 meaning the default of 60).
/// Returns an empty string when nothing usable remains.
pub fn generate_title(prompt: &str, max_runes: usize) -> String {
    let lowered = prompt.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    let mut words = Vec::with_capacity(MAX_TITLE_WORDS);
    for found in TITLE_WORD_RE.find_iter(&lowered) {
        let word = found.as_str();
        if TITLE_STOPWORDS.contains(word) {
            continue;
        }
        words.push(title_case(word));
        if words.len() >= MAX_TITLE_WORDS {
            break;
        }
    }
    if words.is_empty() {
        return String::new();
    }

    clip_title(&words.join(" "), max_runes)
}

/// Truncates `title` to `max_runes` runes; non-positive limits use 60.
pub fn clip_title(title: &str, max_runes: usize) -> String {
    let limit = if max_runes == 0 {
        DEFAULT_MAX_TITLE_RUNES
    } else {
        max_runes
    };
    if rune_len(title) > limit {
        title.chars().take(limit).collect()
    } else {
        title.to_string()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_skips_stopwords_and_caps_words() {
        let title = generate_title("what do gen z in nashville spend on streaming", 0);
        assert_eq!(title, "What Do Gen Z Nashville Spend Streaming");
    }

    #[test]
    fn title_limits_to_eight_words() {
        let title = generate_title("one two three four five six seven eight nine ten", 0);
        assert_eq!(title.split(' ').count(), 8);
    }

    #[test]
    fn title_empty_for_blank_or_stopword_prompts() {
        assert_eq!(generate_title("", 0), "");
        assert_eq!(generate_title("the of and", 0), "");
        assert_eq!(generate_title("???", 0), "");
    }

    #[test]
    fn clip_title_respects_rune_limit() {
        assert_eq!(clip_title("Short Title", 0), "Short Title");
        assert_eq!(clip_title("abcdef", 3), "abc");
    }
}
