//! Query-side analysis: token and entity extraction, keyword simplification,
//! and the overlap score the answer engine blends with the index score.
//!
//! Entities come in two tiers. The broad tier (quoted phrases, numbers,
//! capitalized words, long tokens) feeds the phrase-match boost. The strict
//! "strong" tier (numbers, long entities, compound capitalized phrases,
//! proper nouns) gates acceptance, because a proper noun like a city name
//! should bind an answer far harder than an ordinary long word.

use crate::text::{is_capitalized, is_number, rune_len, ALNUM_RE};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Quoted substrings in straight or curly single/double quotes.
static QUOTED_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)"|‘([^’]+)’|“([^”]+)”|'([^']+)'"#).expect("static regex")
});

/// Words dropped when reducing a natural-language question to keywords:
/// articles, conjunctions, interrogatives, and a few domain-generic words.
static QUERY_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "the", "a", "an", "and", "or", "of", "to", "in", "is", "are", "for", "on", "with", "by",
        "from", "at", "as", "that", "this", "it", "be", "was", "were", "how", "much", "more",
        "likely", "do", "does", "what", "which", "new", "brands", "products", "find", "out",
        "about",
    ]
    .into_iter()
    .collect()
});

/// Very generic words excluded from content terms, keeping the focus on
/// topical nouns like "investments" or "affluent".
static GENERIC_CONTENT_DROP: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "interested",
        "interest",
        "interests",
        "percentage",
        "percent",
        "share",
        "likely",
        "likelihood",
        "compared",
        "comparison",
        "average",
        "overall",
        "people",
        "person",
        "new",
        "brands",
        "products",
        "find",
        "out",
        "about",
    ]
    .into_iter()
    .collect()
});

/// Tokens and entities pulled from one prompt. Transient, one per query.
#[derive(Debug, Clone, Default)]
pub struct QueryTerms {
    /// All non-stopword tokens, lowercased.
    pub all_tokens: HashSet<String>,
    /// Quoted phrases, numbers, capitalized words, and long tokens.
    pub entities: HashSet<String>,
    /// The entity set in sorted order, for deterministic boost iteration.
    pub entity_list: Vec<String>,
}

/// Pulls tokens and entities from `prompt`.
pub fn extract_query_terms(prompt: &str) -> QueryTerms {
    let trimmed = prompt.trim();
    let lowered = trimmed.to_lowercase();

    let mut all_tokens = HashSet::new();
    for found in ALNUM_RE.find_iter(&lowered) {
        let token = found.as_str();
        if QUERY_STOPWORDS.contains(token) {
            continue;
        }
        all_tokens.insert(token.to_string());
    }

    let mut entities = HashSet::new();

    for captures in QUOTED_PHRASE_RE.captures_iter(trimmed) {
        for group in captures.iter().skip(1).flatten() {
            let phrase = group.as_str().trim();
            if !phrase.is_empty() {
                entities.insert(phrase.to_lowercase());
            }
        }
    }

    for found in ALNUM_RE.find_iter(trimmed) {
        let raw = found.as_str();
        let lowercased = raw.to_lowercase();
        if QUERY_STOPWORDS.contains(lowercased.as_str()) {
            continue;
        }
        if is_number(raw) || is_capitalized(raw) || rune_len(&lowercased) >= 6 {
            entities.insert(lowercased);
        }
    }

    let mut entity_list: Vec<String> = entities.iter().cloned().collect();
    entity_list.sort_unstable();

    QueryTerms {
        all_tokens,
        entities,
        entity_list,
    }
}

/// Reduces a long natural-language question to a compact keyword query for
/// the retrieval fallback. Falls back to every token when stopword stripping
/// removes them all; empty input yields an empty string.
pub fn simplify_query(prompt: &str) -> String {
    let lowered = prompt.to_lowercase();
    let tokens: Vec<&str> = ALNUM_RE.find_iter(&lowered).map(|m| m.as_str()).collect();
    if tokens.is_empty() {
        return String::new();
    }
    let kept: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|token| !QUERY_STOPWORDS.contains(token))
        .collect();
    if kept.is_empty() {
        return tokens.join(" ");
    }
    kept.join(" ")
}

/// Generic topical terms from the prompt: non-capitalized tokens of length
/// ≥5 plus quoted phrases of ≥5 chars, minus the generic drop list.
/// Capitalized words are qualifiers, not topics, so they are excluded.
pub fn content_terms(prompt: &str) -> Vec<String> {
    let lowered = prompt.to_lowercase();
    let mut set = HashSet::new();

    for found in ALNUM_RE.find_iter(&lowered) {
        let token = found.as_str();
        if QUERY_STOPWORDS.contains(token) {
            continue;
        }
        if rune_len(token) >= 5 && !GENERIC_CONTENT_DROP.contains(token) {
            set.insert(token.to_string());
        }
    }

    for captures in QUOTED_PHRASE_RE.captures_iter(prompt) {
        for group in captures.iter().skip(1).flatten() {
            let phrase = group.as_str().trim().to_lowercase();
            if rune_len(&phrase) >= 5 && !GENERIC_CONTENT_DROP.contains(phrase.as_str()) {
                set.insert(phrase);
            }
        }
    }

    for found in ALNUM_RE.find_iter(prompt) {
        let raw = found.as_str();
        if is_capitalized(raw) {
            set.remove(&raw.to_lowercase());
        }
    }

    let mut terms: Vec<String> = set.into_iter().collect();
    terms.sort_unstable();
    terms
}

/// The strict entity tier used for acceptance gating: numeric or long
/// entities, compound capitalized phrases ("New York City", "Gen Z"), and
/// single proper nouns of rune length ≥4.
pub fn strong_entities(prompt: &str, terms: &QueryTerms) -> HashSet<String> {
    let mut strong = HashSet::new();

    for entity in &terms.entities {
        if is_number(entity) || rune_len(entity) >= 5 {
            strong.insert(entity.clone());
        }
    }

    let tokens: Vec<&str> = ALNUM_RE.find_iter(prompt).map(|m| m.as_str()).collect();
    let mut add_phrase = |parts: &[&str]| {
        let phrase = parts.join(" ").to_lowercase();
        if !phrase.trim().is_empty() {
            strong.insert(phrase);
        }
    };
    for i in 0..tokens.len().saturating_sub(1) {
        let (a, b) = (tokens[i], tokens[i + 1]);
        // "Gen" followed by a single capital letter ("Gen Z", "Gen X").
        if a.eq_ignore_ascii_case("gen") && rune_len(b) == 1 && is_capitalized(b) {
            add_phrase(&[a, b]);
        }
        if is_capitalized(a) && is_capitalized(b) {
            add_phrase(&[a, b]);
            if i + 2 < tokens.len() && is_capitalized(tokens[i + 2]) {
                add_phrase(&[a, b, tokens[i + 2]]);
            }
        }
    }

    for token in &tokens {
        if is_capitalized(token) && rune_len(token) >= 4 {
            strong.insert(token.to_lowercase());
        }
    }

    strong
}

/// Jaccard overlap between the query tokens and the snippet tokens, plus a
/// +0.06 boost per entity phrase contained in the snippet, capped at +0.24.
/// Clamped to [0, 1].
pub fn overlap_relevance(snippet: &str, terms: &QueryTerms) -> f64 {
    if terms.all_tokens.is_empty() {
        return 0.0;
    }
    let snippet_lower = snippet.to_lowercase();
    let snippet_tokens: HashSet<&str> = ALNUM_RE
        .find_iter(&snippet_lower)
        .map(|m| m.as_str())
        .collect();

    let inter = terms
        .all_tokens
        .iter()
        .filter(|token| snippet_tokens.contains(token.as_str()))
        .count();
    let union = snippet_tokens.len() + terms.all_tokens.len() - inter;
    if union == 0 {
        return 0.0;
    }
    let jaccard = inter as f64 / union as f64;

    let mut boost: f64 = 0.0;
    for entity in &terms.entity_list {
        if !entity.is_empty() && snippet_lower.contains(entity.as_str()) {
            boost += 0.06;
        }
    }
    boost = boost.min(0.24);

    (jaccard + boost).min(1.0)
}

/// Which strong entities a snippet contains, case-insensitively.
pub(crate) fn strong_entity_hits(snippet: &str, strong: &HashSet<String>) -> HashSet<String> {
    if strong.is_empty() {
        return HashSet::new();
    }
    let snippet_lower = snippet.to_lowercase();
    strong
        .iter()
        .filter(|entity| !entity.is_empty() && snippet_lower.contains(entity.as_str()))
        .cloned()
        .collect()
}
