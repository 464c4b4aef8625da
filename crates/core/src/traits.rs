use crate::models::SearchHit;

/// The one capability the answer engine needs from a search backend. Any
/// implementation returning ranked snippets can stand in for the production
/// paragraph index, including test fakes.
pub trait Index {
    fn top_k(&self, query: &str, k: usize) -> Vec<SearchHit>;
}
