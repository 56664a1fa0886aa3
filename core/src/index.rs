use crate::corpus::Document;
use crate::stem::stem;
use crate::tokenizer::tokenize;
use std::collections::HashMap;

/// Position of a document in its corpus generation. Doubles as the ranking tie-break.
pub type DocId = u32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc_id: DocId,
    pub weight: f32, // tf-idf weight
}

/// Immutable TF-IDF index over one corpus generation.
///
/// Everything a query touches (vectors, idf, vocabulary, stem groups) comes
/// from the same build; a refresh produces a new `Index` instead of mutating
/// this one.
#[derive(Debug, Default)]
pub struct Index {
    generation: u64,
    docs: Vec<Document>,
    vectors: Vec<HashMap<String, f32>>,
    postings: HashMap<String, Vec<Posting>>, // postings sorted by doc_id
    idf: HashMap<String, f32>,
    vocabulary: Vec<String>, // sorted
    stem_groups: HashMap<String, Vec<String>>,
}

/// Smoothed idf: ln((N + 1) / (df + 1)) + 1. Never below 1, defined for N = 1.
pub fn idf_weight(num_docs: usize, df: u32) -> f32 {
    ((num_docs as f32 + 1.0) / (df as f32 + 1.0)).ln() + 1.0
}

impl Index {
    pub fn empty() -> Self { Self::default() }

    pub fn build(docs: Vec<Document>, generation: u64) -> Self {
        let n = docs.len();

        // Term frequencies per document and document frequencies per term
        let mut tfs: Vec<HashMap<String, f32>> = Vec::with_capacity(n);
        let mut df: HashMap<String, u32> = HashMap::new();
        for doc in &docs {
            let terms = tokenize(&format!("{} {}", doc.title, doc.body));
            let total = terms.len().max(1) as f32;
            let mut counts: HashMap<String, u32> = HashMap::new();
            for term in terms {
                *counts.entry(term).or_insert(0) += 1;
            }
            for term in counts.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }
            tfs.push(counts.into_iter().map(|(t, c)| (t, c as f32 / total)).collect());
        }

        let idf: HashMap<String, f32> = df.iter().map(|(t, &d)| (t.clone(), idf_weight(n, d))).collect();

        let mut vectors: Vec<HashMap<String, f32>> = Vec::with_capacity(n);
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        for (doc_id, frequencies) in tfs.into_iter().enumerate() {
            let mut vector = HashMap::with_capacity(frequencies.len());
            for (term, tf) in frequencies {
                let weight = tf * idf[&term];
                postings.entry(term.clone()).or_default().push(Posting { doc_id: doc_id as DocId, weight });
                vector.insert(term, weight);
            }
            vectors.push(vector);
        }

        let mut vocabulary: Vec<String> = df.into_keys().collect();
        vocabulary.sort_unstable();

        let mut stem_groups: HashMap<String, Vec<String>> = HashMap::new();
        for term in &vocabulary {
            stem_groups.entry(stem(term).to_string()).or_default().push(term.clone());
        }

        tracing::info!(
            generation,
            num_docs = n,
            vocabulary = vocabulary.len(),
            stem_groups = stem_groups.len(),
            "index built"
        );
        Self { generation, docs, vectors, postings, idf, vocabulary, stem_groups }
    }

    pub fn generation(&self) -> u64 { self.generation }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn document(&self, doc_id: DocId) -> Option<&Document> { self.docs.get(doc_id as usize) }

    /// Sparse tf-idf vector of one document.
    pub fn vector(&self, doc_id: DocId) -> Option<&HashMap<String, f32>> { self.vectors.get(doc_id as usize) }

    pub fn postings(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn idf(&self, term: &str) -> Option<f32> { self.idf.get(term).copied() }

    /// The vocabulary's own copy of `token`, if it is a known term.
    pub fn term(&self, token: &str) -> Option<&str> {
        self.vocabulary
            .binary_search_by(|t| t.as_str().cmp(token))
            .ok()
            .map(|i| self.vocabulary[i].as_str())
    }

    pub fn vocabulary(&self) -> &[String] { &self.vocabulary }

    /// Vocabulary terms whose stem is `root`, in vocabulary order.
    pub fn stem_group(&self, root: &str) -> &[String] {
        self.stem_groups.get(root).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stem_group_count(&self) -> usize { self.stem_groups.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, title: &str, body: &str) -> Document {
        Document::new(id, title, body, None)
    }

    fn sample() -> Index {
        Index::build(
            vec![
                doc("a", "Rivian adventure", "rivian charging network"),
                doc("b", "Rivian battery", "battery pack"),
                doc("c", "Rivian chargers", "home charger install"),
            ],
            1,
        )
    }

    #[test]
    fn idf_is_one_for_terms_in_every_document() {
        let idx = sample();
        assert_eq!(idx.idf("rivian"), Some(1.0));
        let rare = idx.idf("adventure").unwrap();
        assert!(rare > 1.0);
        assert!((rare - ((4.0f32 / 2.0).ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn idf_defined_for_single_document() {
        assert_eq!(idf_weight(1, 1), 1.0);
        assert!(idf_weight(10, 1) > idf_weight(10, 10));
    }

    #[test]
    fn tf_is_normalized_by_document_length() {
        let idx = sample();
        // doc b: rivian, battery, battery, pack
        let v = idx.vector(1).unwrap();
        let battery_idf = idx.idf("battery").unwrap();
        assert!((v["battery"] - 0.5 * battery_idf).abs() < 1e-6);
        assert!((v["rivian"] - 0.25).abs() < 1e-6);
        assert!(!v.contains_key("adventure"));
    }

    #[test]
    fn postings_follow_corpus_order() {
        let idx = sample();
        let ids: Vec<DocId> = idx.postings("rivian").iter().map(|p| p.doc_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(idx.postings("missing").is_empty());
    }

    #[test]
    fn vocabulary_and_stem_groups() {
        let idx = sample();
        assert!(idx.vocabulary().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(idx.term("pack"), Some("pack"));
        assert_eq!(idx.term("the"), None);
        assert_eq!(idx.stem_group("charg"), &["charger".to_string(), "chargers".to_string(), "charging".to_string()]);
        assert!(idx.stem_group("nothing").is_empty());
    }

    #[test]
    fn empty_corpus_builds_empty_index() {
        let idx = Index::build(Vec::new(), 3);
        assert!(idx.is_empty());
        assert!(idx.vocabulary().is_empty());
        assert_eq!(idx.generation(), 3);
    }

    #[test]
    fn documents_without_terms_have_empty_vectors() {
        let idx = Index::build(vec![doc("x", "", "the a an"), doc("y", "Road", "")], 1);
        assert_eq!(idx.len(), 2);
        assert!(idx.vector(0).unwrap().is_empty());
        assert!((idx.vector(1).unwrap()["road"] - idx.idf("road").unwrap()).abs() < 1e-6);
    }
}
