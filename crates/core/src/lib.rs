//! fact-search-core answers natural-language questions against a fixed
//! corpus of Markdown facts. It is intentionally small and deterministic:
//!
//!   - No logging in the library (callers decide how/what to log)
//!   - Unicode-aware tokenization with optional stopword removal
//!   - Immutable, read-only index after construction, safe for concurrent use
//!   - Deterministic scoring and sorting (stable order for ties)
//!   - Gated acceptance: declining to answer is a designed outcome
//!
//! Index scoring uses Jaccard similarity between the query token set and
//! each paragraph's token set; the answer engine blends that with an
//! entity-aware overlap score before deciding whether to answer at all.

pub mod answer;
pub mod error;
pub mod index;
pub mod ingest;
pub mod models;
pub mod preprocess;
pub mod query;
pub mod text;
pub mod title;
pub mod traits;

pub use answer::{AnswerEngine, DECLINE_MESSAGE, DEFAULT_THRESHOLD};
pub use error::IngestError;
pub use index::FactIndex;
pub use ingest::{
    build_corpus_best_effort, digest_file, discover_markdown_files, CorpusReport, SkippedFile,
};
pub use models::{Answer, CorpusFingerprint, IndexConfig, SearchHit};
pub use preprocess::{flatten_tables_to_lines, prepare_markdown};
pub use query::{
    content_terms, extract_query_terms, overlap_relevance, simplify_query, strong_entities,
    QueryTerms,
};
pub use text::{collapse_whitespace_lines, normalize_whitespace, tokenize};
pub use title::{clip_title, generate_title};
pub use traits::Index;
