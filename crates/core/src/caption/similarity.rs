//! Bigram similarity used to decide whether neighbouring captions belong
//! with the one that matched the search.

use std::collections::HashMap;
use tracing::trace;

/// Compare two strings and return a score between 0.0 and 1.0.
/// The way this works is by computing the Sørensen–Dice coefficient over
/// character bigrams after lowercasing and dropping all whitespace.
pub fn compare(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_default() += 1;
    }
    let mut shared = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }
    let score = (2 * shared) as f64 / (a.len() + b.len() - 2) as f64;
    trace!("compare shared={} score={:.3}", shared, score);
    score
}

fn normalize(s: &str) -> Vec<char> {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(compare("Unforgettable", "unforgettable"), 1.0);
        assert_eq!(compare("a", "A"), 1.0);
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(compare("luncheon  time", "Luncheon time"), 1.0);
    }

    #[test]
    fn short_strings_score_zero() {
        assert_eq!(compare("a", "b"), 0.0);
        assert_eq!(compare("", "hello"), 0.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(compare("abc", "xyz"), 0.0);
    }

    /// "night" and "nacht" share only the `ht` bigram: 2 * 1 / (5 + 5 - 2).
    #[test]
    fn partial_overlap_uses_dice_coefficient() {
        assert!((compare("night", "nacht") - 0.25).abs() < 1e-9);
    }

    /// Repeated bigrams are only matched as many times as they appear.
    #[test]
    fn repeated_bigrams_count_once_each() {
        // "aaaa" has three `aa` pairs, "aa" has one.
        assert!((compare("aaaa", "aa") - 0.5).abs() < 1e-9);
    }
}
