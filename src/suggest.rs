//! Ranked label suggestions for free-text sector input.
//!
//! Suggestions only help the user pick a label. The chosen label still has
//! to match a benchmark row exactly when it reaches
//! [`crate::benchmark::BenchmarkValidator::validate`].
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tabled::Tabled;

/// Similarity of a query to a candidate label, in `[0, 1]`.
pub trait SimilarityStrategy {
    fn score(&self, query: &str, candidate: &str) -> f64;
}

fn fold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// `1 - levenshtein / max_len` over lower-cased characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistance;

impl EditDistance {
    pub fn distance(a: &str, b: &str) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let mut prev: Vec<usize> = (0..=b.len()).collect();
        let mut cur = vec![0; b.len() + 1];
        for (i, ca) in a.iter().enumerate() {
            cur[0] = i + 1;
            for (j, cb) in b.iter().enumerate() {
                let substitution = prev[j] + usize::from(ca != cb);
                cur[j + 1] = substitution.min(prev[j + 1] + 1).min(cur[j] + 1);
            }
            std::mem::swap(&mut prev, &mut cur);
        }
        prev[b.len()]
    }
}

impl SimilarityStrategy for EditDistance {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        let (q, c) = (fold(query), fold(candidate));
        let longest = q.chars().count().max(c.chars().count());
        if longest == 0 {
            return 0.0;
        }
        1.0 - Self::distance(&q, &c) as f64 / longest as f64
    }
}

/// Jaccard overlap of word tokens. Punctuation such as `/` splits words.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlap;

impl TokenOverlap {
    fn tokens(s: &str) -> BTreeSet<String> {
        fold(s)
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl SimilarityStrategy for TokenOverlap {
    fn score(&self, query: &str, candidate: &str) -> f64 {
        let q = Self::tokens(query);
        let c = Self::tokens(candidate);
        let union = q.union(&c).count();
        if union == 0 {
            return 0.0;
        }
        q.intersection(&c).count() as f64 / union as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct Suggestion {
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Score", display_with = "display_score")]
    pub score: f64,
}

fn display_score(score: &f64) -> String {
    format!("{:.3}", score)
}

/// Up to `limit` candidates with a positive score, best first; equal scores
/// are ordered by label.
pub fn suggest<S, I, T>(query: &str, candidates: I, strategy: &S, limit: usize) -> Vec<Suggestion>
where
    S: SimilarityStrategy + ?Sized,
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut ranked: Vec<Suggestion> = candidates
        .into_iter()
        .map(|c| Suggestion {
            score: strategy.score(query, c.as_ref()),
            label: c.as_ref().to_string(),
        })
        .filter(|s| s.score > 0.0)
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    ranked.dedup_by(|a, b| a.label == b.label);
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_distance() {
        assert_eq!(EditDistance::distance("kitten", "sitting"), 3);
        assert_eq!(EditDistance::distance("", "abc"), 3);
        assert_eq!(EditDistance::distance("same", "same"), 0);
    }

    #[test]
    fn edit_score_is_case_insensitive() {
        assert_eq!(EditDistance.score("Groceries", "groceries"), 1.0);
        assert_eq!(EditDistance.score("", ""), 0.0);
        assert!(EditDistance.score("grocerys", "Groceries") > 0.7);
    }

    #[test]
    fn token_overlap_splits_on_punctuation() {
        let s = TokenOverlap.score("warung kelontong", "Toko/Warung Kelontong");
        assert!((s - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(TokenOverlap.score("bengkel", "Pasar"), 0.0);
    }

    #[test]
    fn ranks_best_first_and_respects_limit() {
        let labels = ["Bakery", "Groceries", "Grocery Wholesale", "Hardware"];
        let out = suggest("grocery", labels, &EditDistance, 2);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].label, "Groceries");
        assert!(out[0].score >= out[1].score);
    }

    #[test]
    fn zero_scores_are_dropped() {
        let candidates = vec!["Pasar".to_string(), "Bengkel Kendaraan".to_string()];
        let out = suggest("bengkel", candidates, &TokenOverlap, 10);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].label, "Bengkel Kendaraan");
    }

    #[test]
    fn strategies_are_pluggable() {
        let strategies: Vec<Box<dyn SimilarityStrategy>> =
            vec![Box::new(EditDistance), Box::new(TokenOverlap)];
        for s in &strategies {
            let out = suggest("Groceries", ["Groceries"], &**s, 1);
            assert_eq!(out[0].score, 1.0);
        }
    }
}
