//! "Did you mean" suggestions for mistyped commands

use strsim::normalized_damerau_levenshtein;

/// Scores how far `input` is from `candidate`: 0.0 is identical, 1.0 shares nothing
pub trait Scorer: Send + Sync {
    fn score(&self, input: &str, candidate: &str) -> f64;
}

/// Normalized Damerau-Levenshtein distance
#[derive(Debug, Clone, Copy, Default)]
pub struct EditDistance;

impl Scorer for EditDistance {
    fn score(&self, input: &str, candidate: &str) -> f64 {
        1.0 - normalized_damerau_levenshtein(input, candidate)
    }
}

/// A scorer plus the score a match must beat to be surfaced
pub struct Suggester {
    scorer: Box<dyn Scorer>,
    threshold: f64,
}

impl Default for Suggester {
    fn default() -> Self {
        Suggester::new(EditDistance, 0.4)
    }
}

impl std::fmt::Debug for Suggester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Suggester")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl Suggester {
    pub fn new(scorer: impl Scorer + 'static, threshold: f64) -> Self {
        Suggester {
            scorer: Box::new(scorer),
            threshold,
        }
    }

    /// The best-scoring candidate, if it scores under the threshold
    #[must_use]
    pub fn suggest<'a>(&self, input: &str, candidates: &'a [String]) -> Option<&'a str> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        candidates
            .iter()
            .map(|candidate| (candidate, self.scorer.score(input, candidate)))
            .filter(|(_, score)| *score < self.threshold)
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(candidate, _)| candidate.as_str())
    }
}
