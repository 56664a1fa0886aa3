//! Tuning constants for retrieval.
//!
//! These are compile-time constants; runtime configuration (data directory,
//! reload interval, admin token) lives in the binaries' CLI arguments and
//! environment variables.

/// Maximum number of documents returned by a search.
pub const TOP_K: usize = 5;

/// Shortest run of ASCII letters kept as a term.
pub const MIN_TERM_LEN: usize = 2;

/// Weight of a term reached through the query token's stem group.
pub const STEM_WEIGHT: f32 = 0.85;

/// Weight of a vocabulary term at edit distance 1 from the query token.
pub const FUZZY_WEIGHT_DIST1: f32 = 0.7;

/// Weight of a vocabulary term at edit distance 2 from the query token.
pub const FUZZY_WEIGHT_DIST2: f32 = 0.5;

/// Tokens shorter than this are never fuzzy matched.
pub const FUZZY_MIN_TOKEN_LEN: usize = 5;

/// Tokens up to this length tolerate a single edit; longer ones tolerate two.
pub const FUZZY_SHORT_TOKEN_LEN: usize = 6;

/// Rendered in place of the knowledge block when no document matched.
pub const NO_CONTEXT_MESSAGE: &str =
    "(No relevant content found in the knowledge base for this question.)";
