use crate::config::MIN_TERM_LEN;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[a-z]+").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","the","is","are","was","were","be","been","being","have","has","had",
            "do","does","did","will","would","could","should","may","might","shall","can",
            "and","but","or","nor","not","no","so","if","then","than","that","this","these",
            "those","it","its","of","in","on","at","to","for","with","by","from","about",
            "what","which","who","how","when","where","why","i","me","my","you","your","we",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Tokenize text into terms: lowercase, maximal runs of ASCII letters of at least
/// two characters, stopwords removed. Order and duplicates are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    RE.find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| t.len() >= MIN_TERM_LEN && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = tokenize("Charging the R1T, at 11kW!");
        assert_eq!(t, vec!["charging", "kw"]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let t = tokenize("network Network NETWORK road");
        assert_eq!(t, vec!["network", "network", "network", "road"]);
    }

    #[test]
    fn punctuation_only_is_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("?! -- ... 42").is_empty());
    }
}
