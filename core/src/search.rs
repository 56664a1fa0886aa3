//! Query scoring and ranking over one index snapshot.

use crate::config::TOP_K;
use crate::corpus::Document;
use crate::expand::{expand, Expansion};
use crate::index::{DocId, Index};
use crate::tokenizer::tokenize;

#[derive(Debug, Clone, Copy)]
pub struct SearchHit<'a> {
    pub doc_id: DocId,
    pub score: f32,
    pub document: &'a Document,
}

#[derive(Debug, Clone)]
pub struct KeywordExplanation<'a> {
    pub keyword: String,
    pub expansions: Vec<Expansion<'a>>,
}

/// Rank documents for `query`, returning at most [`TOP_K`] hits.
pub fn search<'a>(query: &str, index: &'a Index) -> Vec<SearchHit<'a>> {
    search_top_k(query, index, TOP_K)
}

/// Rank documents for `query`, returning at most `k` hits.
///
/// Every keyword (repeats included) is expanded and each expansion adds
/// `tfidf * weight` to every document containing the term. Scores are summed
/// without normalization. Documents scoring zero are dropped; ties keep corpus
/// order.
pub fn search_top_k<'a>(query: &str, index: &'a Index, k: usize) -> Vec<SearchHit<'a>> {
    let keywords = tokenize(query);
    if keywords.is_empty() || index.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scores = vec![0.0f32; index.len()];
    for keyword in &keywords {
        for exp in expand(keyword, index) {
            for p in index.postings(exp.term) {
                scores[p.doc_id as usize] += p.weight * exp.weight;
            }
        }
    }

    let mut hits: Vec<SearchHit<'a>> = scores
        .into_iter()
        .zip(index.documents())
        .enumerate()
        .filter(|(_, (score, _))| *score > 0.0)
        .map(|(doc_id, (score, document))| SearchHit { doc_id: doc_id as DocId, score, document })
        .collect();
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.doc_id.cmp(&b.doc_id)));
    let total_hits = hits.len();
    hits.truncate(k);

    tracing::debug!(query, generation = index.generation(), keywords = keywords.len(), total_hits, "search");
    hits
}

/// Per-keyword expansions for `query`, in query order.
pub fn explain<'a>(query: &str, index: &'a Index) -> Vec<KeywordExplanation<'a>> {
    tokenize(query)
        .into_iter()
        .map(|keyword| {
            let expansions = expand(&keyword, index);
            KeywordExplanation { keyword, expansions }
        })
        .collect()
}
