use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A ranked snippet with its Jaccard similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub snippet: String,
    pub score: f64,
}

/// Index construction knobs. Plain struct with documented defaults; pass it
/// by value to the constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Paragraphs shorter than this many runes are skipped. 0 disables the
    /// filter. Default 40.
    pub min_paragraph_runes: usize,
    /// Optional stopword set applied during tokenization. Default none.
    pub stopwords: Option<HashSet<String>>,
    /// Hard cap on indexed documents. 0 means unlimited. Default 0.
    pub max_docs: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_paragraph_runes: 40,
            stopwords: None,
            max_docs: 0,
        }
    }
}

impl IndexConfig {
    /// Normalizes a raw stopword list: lowercased, trimmed, empties dropped.
    /// An empty list leaves the filter disabled.
    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cleaned: HashSet<String> = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_lowercase())
            .filter(|word| !word.is_empty())
            .collect();
        if !cleaned.is_empty() {
            self.stopwords = Some(cleaned);
        }
        self
    }
}

/// The outcome of a retrieve call. `score` is present only on acceptance;
/// a decline carries the fixed message and `None`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    pub reply: String,
    pub score: Option<f64>,
}

/// Identity and provenance of one corpus file picked up during folder
/// ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusFingerprint {
    pub document_id: String,
    pub title: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}
