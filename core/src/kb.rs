use crate::context::ContextPage;
use crate::corpus::{load_corpus, Document};
use crate::index::Index;
use crate::search::search;
use anyhow::Result;
use parking_lot::{Mutex, RwLock};
use std::path::Path;
use std::sync::Arc;

/// The currently published index.
///
/// Readers clone the `Arc` and keep querying that snapshot even if a refresh
/// publishes a newer one meanwhile. Refreshes build outside the read path and
/// swap the reference in a single write.
#[derive(Default)]
pub struct KnowledgeBase {
    current: RwLock<Arc<Index>>,
    refresh: Mutex<()>,
}

impl KnowledgeBase {
    pub fn new() -> Self { Self::default() }

    pub fn snapshot(&self) -> Arc<Index> { self.current.read().clone() }

    /// Build an index over `docs` and publish it as the next generation.
    pub fn replace(&self, docs: Vec<Document>) -> Arc<Index> {
        let _guard = self.refresh.lock();
        let generation = self.current.read().generation() + 1;
        let index = Arc::new(Index::build(docs, generation));
        *self.current.write() = index.clone();
        tracing::info!(generation, num_docs = index.len(), "published index");
        index
    }

    /// Reload the corpus from `dir` and publish it. On error the current index stays.
    pub fn reload_from<P: AsRef<Path>>(&self, dir: P) -> Result<Arc<Index>> {
        let docs = load_corpus(dir)?;
        Ok(self.replace(docs))
    }

    /// Top pages for `query` from the current snapshot.
    pub fn search(&self, query: &str) -> Vec<ContextPage> {
        let index = self.snapshot();
        search(query, &index).into_iter().map(|hit| ContextPage::from(hit.document)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn starts_empty() {
        let kb = KnowledgeBase::new();
        assert_eq!(kb.snapshot().generation(), 0);
        assert!(kb.search("anything").is_empty());
    }

    #[test]
    fn replace_publishes_new_generation_and_keeps_old_snapshots() {
        let kb = KnowledgeBase::new();
        kb.replace(vec![Document::new("1", "Tent", "camping tent", None)]);
        let old = kb.snapshot();

        let new = kb.replace(vec![Document::new("2", "Stove", "camp stove", None)]);
        assert_eq!(old.generation(), 1);
        assert_eq!(new.generation(), 2);
        assert_eq!(kb.snapshot().generation(), 2);

        // the old snapshot still answers from its own generation
        assert_eq!(search("tent", &old).len(), 1);
        assert!(kb.search("tent").is_empty());
        assert_eq!(kb.search("stove")[0].title, "Stove");
    }

    /// Generation `round` publishes `2 + round % 3` tent pages, all titled with the same marker.
    fn round_corpus(round: usize) -> Vec<Document> {
        let marker = format!("round {round}");
        (0..2 + round % 3).map(|i| Document::new(format!("{round}-{i}"), marker.clone(), "tent", None)).collect()
    }

    #[test]
    fn concurrent_queries_see_one_whole_generation() {
        let kb = KnowledgeBase::new();
        kb.replace(round_corpus(0));
        let done = AtomicBool::new(false);

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut checked = 0;
                    while !done.load(Ordering::Acquire) || checked == 0 {
                        let pages = kb.search("tent");
                        let marker = &pages[0].title;
                        assert!(pages.iter().all(|p| &p.title == marker), "mixed generations: {pages:?}");
                        let round: usize = marker["round ".len()..].parse().unwrap();
                        assert_eq!(pages.len(), 2 + round % 3);
                        checked += 1;
                    }
                });
            }
            s.spawn(|| {
                for round in 1..=200 {
                    kb.replace(round_corpus(round));
                }
                done.store(true, Ordering::Release);
            });
        });

        assert_eq!(kb.snapshot().generation(), 201);
    }

    #[test]
    fn failed_reload_keeps_current_index() {
        let kb = KnowledgeBase::new();
        kb.replace(vec![Document::new("1", "Tent", "", None)]);
        assert!(kb.reload_from("/definitely/not/a/dir").is_err());
        assert_eq!(kb.snapshot().generation(), 1);
    }
}
