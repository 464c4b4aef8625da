//! Tokenization and whitespace helpers shared by the index, the query
//! extractor, and the answer engine. Everything here is pure and
//! deterministic; the compiled tables live for the whole process.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// One-or-more Unicode letters followed by zero-or-more digits.
static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+\p{N}*").expect("static regex"));

/// Any run of Unicode letters or digits.
pub(crate) static ALNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("static regex"));

/// Lowercases `text` and extracts its token set, dropping stopwords.
/// Returns an empty set when no tokens remain.
pub fn tokenize(text: &str, stopwords: Option<&HashSet<String>>) -> HashSet<String> {
    let lowered = text.to_lowercase();
    let mut out = HashSet::new();
    for found in WORD_RE.find_iter(&lowered) {
        let word = found.as_str();
        if word.is_empty() {
            continue;
        }
        if let Some(stop) = stopwords {
            if stop.contains(word) {
                continue;
            }
        }
        out.insert(word.to_string());
    }
    out
}

/// Collapses runs of space/tab/carriage-return into a single space while
/// preserving every other character. Newlines survive so they can keep
/// acting as paragraph separators downstream.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_space = false;
    for ch in text.chars() {
        if ch == ' ' || ch == '\t' || ch == '\r' {
            if !prev_space {
                out.push(' ');
                prev_space = true;
            }
            continue;
        }
        prev_space = false;
        out.push(ch);
    }
    out
}

/// Trims each line, collapses internal whitespace to one space, and drops
/// empty lines entirely. Applied to assembled replies before returning them.
pub fn collapse_whitespace_lines(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let unified = text.replace("\r\n", "\n");
    let mut out = Vec::new();
    for line in unified.split('\n') {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }
        out.push(parts.join(" "));
    }
    out.join("\n")
}

/// A token counts as numeric when it has at least one digit and otherwise
/// only letters, periods, commas, or percent signs ("2025", "3.5%", "1,200").
pub fn is_number(token: &str) -> bool {
    let mut has_digit = false;
    for ch in token.chars() {
        if ch.is_numeric() {
            has_digit = true;
        } else if !(ch.is_alphabetic() || ch == '.' || ch == ',' || ch == '%') {
            return false;
        }
    }
    has_digit
}

/// True when the first rune is uppercase.
pub fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(|ch| ch.is_uppercase())
}

/// Rune count, as opposed to byte length.
pub fn rune_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_dedupes() {
        let tokens = tokenize("Streaming streaming STREAMING platforms", None);
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("streaming"));
        assert!(tokens.contains("platforms"));
    }

    #[test]
    fn tokenize_keeps_trailing_digits() {
        let tokens = tokenize("survey gwi2025 wave", None);
        assert!(tokens.contains("gwi2025"));
    }

    #[test]
    fn tokenize_drops_stopwords() {
        let stop: HashSet<String> = ["the", "of"].iter().map(|s| s.to_string()).collect();
        let tokens = tokenize("the state of streaming", Some(&stop));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("of"));
        assert!(tokens.contains("state"));
    }

    #[test]
    fn tokenize_stopword_only_input_is_empty() {
        let stop: HashSet<String> = ["the", "of"].iter().map(|s| s.to_string()).collect();
        assert!(tokenize("the of the", Some(&stop)).is_empty());
        assert!(tokenize("!!! ???", None).is_empty());
    }

    #[test]
    fn normalize_whitespace_preserves_newlines() {
        let input = "a  \t b\r\nc\n\nd";
        assert_eq!(normalize_whitespace(input), "a b \nc\n\nd");
    }

    #[test]
    fn collapse_whitespace_lines_drops_empties() {
        let input = "  first   line \n\n second\tline \n";
        assert_eq!(collapse_whitespace_lines(input), "first line\nsecond line");
        assert_eq!(collapse_whitespace_lines(""), "");
    }

    #[test]
    fn number_detection() {
        assert!(is_number("2025"));
        assert!(is_number("3.5%"));
        assert!(is_number("1,200"));
        assert!(is_number("q4"));
        assert!(!is_number("nashville"));
        assert!(!is_number("a-b1"));
    }

    #[test]
    fn capitalization_detection() {
        assert!(is_capitalized("Nashville"));
        assert!(!is_capitalized("nashville"));
        assert!(!is_capitalized(""));
    }
}
