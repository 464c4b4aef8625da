//! In-memory paragraph index over Markdown facts.
//!
//! The index is built once, is strictly read-only afterwards, and is safe
//! for unlimited concurrent readers. Scoring uses Jaccard similarity between
//! the query token set and each paragraph's token set:
//! score = |Q ∩ P| / |Q ∪ P|. Ordering is fully deterministic: score
//! descending, then snippet rune length ascending, then snippet text.

use crate::error::IngestError;
use crate::models::{IndexConfig, SearchHit};
use crate::preprocess::prepare_markdown;
use crate::text::{normalize_whitespace, rune_len, tokenize};
use crate::traits::Index;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Blank-line paragraph boundary: a newline, optional whitespace, newline.
static PARA_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("static regex"));

/// One indexable fact: a trimmed paragraph and its token set.
#[derive(Debug, Clone)]
struct Document {
    text: String,
    tokens: HashSet<String>,
    token_count: usize,
}

/// The production paragraph index. Construction may produce zero documents;
/// that is not an error, and `top_k` simply returns nothing.
#[derive(Debug)]
pub struct FactIndex {
    config: IndexConfig,
    docs: Vec<Document>,
}

impl FactIndex {
    /// Builds an index from the Markdown file at `path`, flattening table
    /// rows into fact lines first. Fails only when the file is unreadable.
    pub fn from_markdown_file(path: &Path, config: IndexConfig) -> Result<Self, IngestError> {
        let prepared = prepare_markdown(path)?;
        Ok(Self::from_text(&prepared, config))
    }

    /// Builds an index by fully consuming `reader`. Paragraphs split on
    /// blank lines.
    pub fn from_reader<R: Read>(mut reader: R, config: IndexConfig) -> Result<Self, IngestError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Ok(Self::from_text(&text, config))
    }

    /// Builds an index from raw UTF-8 text.
    pub fn from_text(text: &str, config: IndexConfig) -> Self {
        let paragraphs = PARA_SPLIT_RE
            .split(text)
            .map(str::trim)
            .filter(|para| !para.is_empty());
        Self::from_paragraphs(paragraphs, config)
    }

    /// Builds an index directly from pre-split paragraphs.
    pub fn from_paragraphs<I, S>(paragraphs: I, config: IndexConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut docs = Vec::new();
        for raw in paragraphs {
            let text = normalize_whitespace(raw.as_ref()).trim().to_string();
            if text.is_empty() {
                continue;
            }
            if config.min_paragraph_runes > 0 && rune_len(&text) < config.min_paragraph_runes {
                continue;
            }
            let tokens = tokenize(&text, config.stopwords.as_ref());
            if tokens.is_empty() {
                continue;
            }
            let token_count = tokens.len();
            docs.push(Document {
                text,
                tokens,
                token_count,
            });
            if config.max_docs > 0 && docs.len() >= config.max_docs {
                break;
            }
        }
        Self { config, docs }
    }

    /// Number of indexed paragraphs.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl Index for FactIndex {
    /// Returns up to `k` best-matching paragraphs. Empty when the index has
    /// no documents or the query holds no tokens. `k == 0` defaults to 3.
    fn top_k(&self, query: &str, k: usize) -> Vec<SearchHit> {
        if self.docs.is_empty() || query.trim().is_empty() {
            return Vec::new();
        }
        let k = if k == 0 { 3 } else { k };

        let query_tokens = tokenize(query, self.config.stopwords.as_ref());
        if query_tokens.is_empty() {
            return Vec::new();
        }
        let query_len = query_tokens.len();

        struct Scored<'a> {
            snippet: &'a str,
            score: f64,
            len_runes: usize,
        }

        let mut scored = Vec::new();
        for doc in &self.docs {
            let over = overlap(&query_tokens, &doc.tokens);
            if over == 0 {
                continue;
            }
            let union = (query_len + doc.token_count - over) as f64;
            if union <= 0.0 {
                continue;
            }
            let score = over as f64 / union;
            if score <= 0.0 {
                continue;
            }
            scored.push(Scored {
                snippet: &doc.text,
                score,
                len_runes: rune_len(&doc.text),
            });
        }
        if scored.is_empty() {
            return Vec::new();
        }

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.len_runes.cmp(&b.len_runes))
                .then_with(|| a.snippet.cmp(b.snippet))
        });

        scored
            .into_iter()
            .take(k)
            .map(|item| SearchHit {
                snippet: item.snippet.to_string(),
                score: item.score,
            })
            .collect()
    }
}

fn overlap(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().filter(|token| large.contains(*token)).count()
}
