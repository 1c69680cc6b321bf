//! Simulated market sentiment.
//!
//! There is no real review feed behind this: scores are drawn from a seeded
//! generator so the "top sentiment" panel is stable across runs. Nothing in
//! scoring or validation reads these values.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEFAULT_SEED: u64 = 42;
pub const SCORE_RANGE: std::ops::Range<f64> = 3.5..4.9;
pub const REVIEW_RANGE: std::ops::Range<u32> = 10..500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketSentiment {
    /// Star rating, `[3.5, 4.9)`.
    pub score: f64,
    pub review_count: u32,
}

/// One entry per village, in input order. Same `count` and `seed`, same
/// output.
pub fn simulate(count: usize, seed: u64) -> Vec<MarketSentiment> {
    let mut rng = StdRng::seed_from_u64(seed);
    let scores: Vec<f64> = (0..count).map(|_| rng.gen_range(SCORE_RANGE)).collect();
    let reviews: Vec<u32> = (0..count).map(|_| rng.gen_range(REVIEW_RANGE)).collect();
    scores
        .into_iter()
        .zip(reviews)
        .map(|(score, review_count)| MarketSentiment { score, review_count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_output_repeats() {
        assert_eq!(simulate(50, DEFAULT_SEED), simulate(50, DEFAULT_SEED));
        assert_ne!(simulate(50, 1), simulate(50, 2));
    }

    #[test]
    fn values_stay_in_range() {
        for s in simulate(500, 7) {
            assert!(SCORE_RANGE.contains(&s.score));
            assert!(REVIEW_RANGE.contains(&s.review_count));
        }
    }

    #[test]
    fn empty_is_empty() {
        assert!(simulate(0, DEFAULT_SEED).is_empty());
    }
}
