//! Token-count estimation.
//!
//! Budgeting code depends only on [`TokenEstimator`], so a real tokenizer can
//! replace the character-ratio proxy without touching selection logic.

/// Approximate characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Strategy for estimating how many tokens a piece of text costs.
pub trait TokenEstimator: Send + Sync {
    /// Estimated token count for `text`.
    fn estimate(&self, text: &str) -> usize;
}

/// `ceil(chars / ratio)` estimator. The default ratio is [`CHARS_PER_TOKEN`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharRatioEstimator {
    chars_per_token: usize,
}

impl CharRatioEstimator {
    /// Create an estimator with a custom ratio. A ratio of 0 is treated as 1.
    pub const fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: if chars_per_token == 0 { 1 } else { chars_per_token },
        }
    }
}

impl Default for CharRatioEstimator {
    fn default() -> Self {
        Self::new(CHARS_PER_TOKEN)
    }
}

impl TokenEstimator for CharRatioEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

impl<F> TokenEstimator for F
where
    F: Fn(&str) -> usize + Send + Sync,
{
    fn estimate(&self, text: &str) -> usize {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_costs_nothing() {
        assert_eq!(CharRatioEstimator::default().estimate(""), 0);
    }

    #[test]
    fn rounds_up() {
        let est = CharRatioEstimator::default();
        assert_eq!(est.estimate("a"), 1);
        assert_eq!(est.estimate("abcd"), 1);
        assert_eq!(est.estimate("abcde"), 2);
        assert_eq!(est.estimate(&"x".repeat(400)), 100);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // 4 chars, 8 bytes
        assert_eq!(CharRatioEstimator::default().estimate("éééé"), 1);
    }

    #[test]
    fn zero_ratio_is_clamped() {
        assert_eq!(CharRatioEstimator::new(0).estimate("abc"), 3);
    }

    #[test]
    fn closures_are_estimators() {
        let words = |text: &str| text.split_whitespace().count();
        let est: &dyn TokenEstimator = &words;
        assert_eq!(est.estimate("one two three"), 3);
    }
}
