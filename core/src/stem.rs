//! Heuristic suffix stripping.
//!
//! Not a linguistic stemmer: it only has to map common variants of a word
//! ("charging", "chargers", "charged") onto a shared root so they land in the
//! same stem group. The suffix order and the minimum word lengths below are
//! fixed; stem groups and therefore ranking depend on them.

/// (suffix, minimum word length, bytes stripped), tested in order.
const RULES: &[(&str, usize, usize)] = &[
    ("ing", 7, 3),
    ("tion", 8, 4),
    ("ness", 8, 4),
    ("ment", 8, 4),
    ("ers", 7, 3),
    ("er", 6, 2),
    ("ed", 6, 2),
    ("ly", 6, 2),
    ("es", 6, 2),
    ("s", 5, 1),
];

/// Words this short are returned unchanged.
const MAX_UNSTEMMED_LEN: usize = 4;

pub fn stem(word: &str) -> &str {
    let len = word.len();
    if len <= MAX_UNSTEMMED_LEN {
        return word;
    }
    for &(suffix, min_len, strip) in RULES {
        if len >= min_len && word.ends_with(suffix) {
            return &word[..len - strip];
        }
    }
    word
}
