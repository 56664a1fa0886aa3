pub mod config;
pub mod context;
pub mod corpus;
pub mod expand;
pub mod fuzzy;
pub mod index;
pub mod kb;
pub mod search;
pub mod stem;
pub mod tokenizer;

pub use context::{render_context, ContextPage};
pub use corpus::{load_corpus, Document};
pub use expand::{expand, Expansion, MatchTier};
pub use index::{DocId, Index, Posting};
pub use kb::KnowledgeBase;
pub use search::{explain, search, search_top_k, KeywordExplanation, SearchHit};
