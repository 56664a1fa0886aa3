//! Bounded edit distance for typo-tolerant matching.
//!
//! The matcher runs once per query token against the whole vocabulary, so the
//! distance computation gives up as soon as the answer is known to exceed the
//! threshold. Callers only ever need "within `max_dist`" or "too far".

use crate::config::{FUZZY_MIN_TOKEN_LEN, FUZZY_SHORT_TOKEN_LEN};

/// Levenshtein distance between `a` and `b` (unit costs, compared byte-wise),
/// or `max_dist + 1` once it is known to exceed `max_dist`.
pub fn edit_distance(a: &str, b: &str, max_dist: usize) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let too_far = max_dist + 1;
    if a.len().abs_diff(b.len()) > max_dist {
        return too_far;
    }
    if a.is_empty() || b.is_empty() {
        return a.len().max(b.len());
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, &cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitute.min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        // rows never shrink below the previous row's minimum
        if row_min > max_dist {
            return too_far;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()].min(too_far)
}

/// Edit budget for a query token of `len` bytes, or `None` when the token is
/// too short for fuzzy matching to mean anything.
pub fn max_distance_for(len: usize) -> Option<usize> {
    if len < FUZZY_MIN_TOKEN_LEN {
        None
    } else if len <= FUZZY_SHORT_TOKEN_LEN {
        Some(1)
    } else {
        Some(2)
    }
}

/// Every vocabulary term within `max_dist` edits of `token`, with its distance,
/// in vocabulary order.
pub fn fuzzy_matches<'a>(token: &str, vocabulary: &'a [String], max_dist: usize) -> Vec<(&'a str, usize)> {
    vocabulary
        .iter()
        .filter(|term| term.len().abs_diff(token.len()) <= max_dist)
        .filter_map(|term| {
            let d = edit_distance(token, term, max_dist);
            (d <= max_dist).then_some((term.as_str(), d))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(a: &str, b: &str) -> usize {
        let (a, b) = (a.as_bytes(), b.as_bytes());
        let mut d = vec![vec![0usize; b.len() + 1]; a.len() + 1];
        for (i, row) in d.iter_mut().enumerate() { row[0] = i; }
        for j in 0..=b.len() { d[0][j] = j; }
        for i in 1..=a.len() {
            for j in 1..=b.len() {
                let cost = usize::from(a[i - 1] != b[j - 1]);
                d[i][j] = (d[i - 1][j - 1] + cost).min(d[i - 1][j] + 1).min(d[i][j - 1] + 1);
            }
        }
        d[a.len()][b.len()]
    }

    fn random_word(rng: &mut StdRng) -> String {
        let len = rng.gen_range(0..9);
        (0..len).map(|_| (b'a' + rng.gen_range(0..4u8)) as char).collect()
    }

    #[test]
    fn exact_distances_within_threshold() {
        assert_eq!(edit_distance("battery", "battery", 2), 0);
        assert_eq!(edit_distance("bateries", "batteries", 2), 1);
        assert_eq!(edit_distance("kitten", "sitting", 3), 3);
        assert_eq!(edit_distance("", "ab", 2), 2);
    }

    #[test]
    fn length_gap_saturates_immediately() {
        assert_eq!(edit_distance("range", "rangefinder", 2), 3);
        assert_eq!(edit_distance("", "abc", 1), 2);
    }

    #[test]
    fn far_strings_saturate() {
        assert_eq!(edit_distance("bateries", "battery", 2), 3);
        assert_eq!(edit_distance("zzqxw", "range", 1), 2);
        // equal length, distance 2, threshold 1
        assert_eq!(edit_distance("ab", "ba", 1), 2);
    }

    #[test]
    fn agrees_with_brute_force_on_random_pairs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..5000 {
            let a = random_word(&mut rng);
            let b = random_word(&mut rng);
            let max_dist = rng.gen_range(0..4);
            let exact = brute_force(&a, &b);
            let bounded = edit_distance(&a, &b, max_dist);
            assert_eq!(bounded <= max_dist, exact <= max_dist, "{a:?} {b:?} max={max_dist}");
            if exact <= max_dist {
                assert_eq!(bounded, exact, "{a:?} {b:?}");
            } else {
                assert_eq!(bounded, max_dist + 1);
            }
        }
    }

    #[test]
    fn thresholds_by_token_length() {
        assert_eq!(max_distance_for(4), None);
        assert_eq!(max_distance_for(5), Some(1));
        assert_eq!(max_distance_for(6), Some(1));
        assert_eq!(max_distance_for(7), Some(2));
    }

    #[test]
    fn scans_vocabulary_in_order() {
        let vocab: Vec<String> = ["batteries", "battery", "charger", "chargers"].iter().map(|s| s.to_string()).collect();
        assert_eq!(fuzzy_matches("bateries", &vocab, 2), vec![("batteries", 1)]);
        assert_eq!(fuzzy_matches("chargr", &vocab, 1), vec![("charger", 1)]);
        assert!(fuzzy_matches("zzqxw", &vocab, 1).is_empty());
    }
}
