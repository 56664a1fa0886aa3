use crate::config::{FUZZY_WEIGHT_DIST1, FUZZY_WEIGHT_DIST2, STEM_WEIGHT};
use crate::fuzzy::{fuzzy_matches, max_distance_for};
use crate::index::Index;
use crate::stem::stem;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    Exact,
    Stem,
    Fuzzy { distance: usize },
}

/// A vocabulary term a query token resolved to, and how much it counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Expansion<'a> {
    pub term: &'a str,
    pub weight: f32,
    pub tier: MatchTier,
}

/// Resolve one query token against the vocabulary.
///
/// Tiers are tried in order (exact, stem group, fuzzy) and the first one that
/// yields anything wins; a token never mixes tiers. An empty result means the
/// token contributes nothing to the score.
pub fn expand<'a>(token: &str, index: &'a Index) -> Vec<Expansion<'a>> {
    if let Some(term) = index.term(token) {
        return vec![Expansion { term, weight: 1.0, tier: MatchTier::Exact }];
    }

    let group = index.stem_group(stem(token));
    if !group.is_empty() {
        return group
            .iter()
            .map(|term| Expansion { term, weight: STEM_WEIGHT, tier: MatchTier::Stem })
            .collect();
    }

    let Some(max_dist) = max_distance_for(token.len()) else {
        return Vec::new();
    };
    fuzzy_matches(token, index.vocabulary(), max_dist)
        .into_iter()
        .map(|(term, distance)| Expansion {
            term,
            weight: if distance <= 1 { FUZZY_WEIGHT_DIST1 } else { FUZZY_WEIGHT_DIST2 },
            tier: MatchTier::Fuzzy { distance },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Document;

    fn index() -> Index {
        Index::build(
            vec![
                Document::new("1", "Charging Network", "Rivian operates the Adventure Network of chargers for road trips.", None),
                Document::new("2", "Battery", "The R1T battery pack provides long range. Spare batteries not included.", None),
                Document::new("3", "Charger", "Wall charger install", None),
            ],
            1,
        )
    }

    #[test]
    fn exact_match_suppresses_other_tiers() {
        let idx = index();
        // "charger" is in the vocabulary and also shares a stem with "charging"/"chargers"
        let exp = expand("charger", &idx);
        assert_eq!(exp, vec![Expansion { term: "charger", weight: 1.0, tier: MatchTier::Exact }]);
    }

    #[test]
    fn stem_group_when_not_in_vocabulary() {
        let idx = index();
        let exp = expand("charged", &idx);
        let terms: Vec<&str> = exp.iter().map(|e| e.term).collect();
        assert_eq!(terms, vec!["charger", "chargers", "charging"]);
        assert!(exp.iter().all(|e| e.tier == MatchTier::Stem && e.weight == STEM_WEIGHT));
    }

    #[test]
    fn fuzzy_weights_by_distance() {
        let idx = index();
        let exp = expand("bateries", &idx);
        assert_eq!(exp, vec![Expansion { term: "batteries", weight: FUZZY_WEIGHT_DIST1, tier: MatchTier::Fuzzy { distance: 1 } }]);

        let exp = expand("adventrue", &idx);
        assert_eq!(exp, vec![Expansion { term: "adventure", weight: FUZZY_WEIGHT_DIST2, tier: MatchTier::Fuzzy { distance: 2 } }]);
    }

    #[test]
    fn short_tokens_are_not_fuzzy_matched() {
        let idx = index();
        // one edit from "pack", but only four letters
        assert!(expand("pakc", &idx).is_empty());
        assert!(expand("rode", &idx).is_empty());
    }

    #[test]
    fn unknown_token_contributes_nothing() {
        let idx = index();
        assert!(expand("zzqxw", &idx).is_empty());
        assert!(expand("anything", &Index::empty()).is_empty());
    }
}
