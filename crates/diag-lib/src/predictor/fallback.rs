//! Fallback probability for classifiers without probability output

use super::Classifier;
use crate::models::RawPrediction;
use anyhow::Result;

/// A label and a probability that is always present
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scored {
    pub label: i64,
    pub probability: f64,
    pub calibrated: bool,
}

/// Wraps any classifier so every inference carries a probability.
///
/// When the inner model reports none, the probability is 1.0 for label 1
/// and 0.0 otherwise. That value is deterministic, not a calibrated
/// confidence, and is flagged as such.
pub struct FallbackProbability<C: ?Sized> {
    inner: Box<C>,
}

impl<C: Classifier + ?Sized> FallbackProbability<C> {
    pub fn new(inner: Box<C>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn score(&self, row: &[f64]) -> Result<Scored> {
        let raw = self.inner.classify(row)?;
        Ok(Self::complete(raw))
    }

    fn complete(raw: RawPrediction) -> Scored {
        match raw.positive_probability {
            Some(probability) => Scored {
                label: raw.label,
                probability,
                calibrated: true,
            },
            None => Scored {
                label: raw.label,
                probability: if raw.label == 1 { 1.0 } else { 0.0 },
                calibrated: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLabel(i64);

    impl Classifier for FixedLabel {
        fn family(&self) -> &str {
            "fixed"
        }
        fn n_features(&self) -> usize {
            1
        }
        fn supports_probability(&self) -> bool {
            false
        }
        fn classify(&self, _row: &[f64]) -> Result<RawPrediction> {
            Ok(RawPrediction {
                label: self.0,
                positive_probability: None,
            })
        }
    }

    struct FixedProbability(f64);

    impl Classifier for FixedProbability {
        fn family(&self) -> &str {
            "fixed"
        }
        fn n_features(&self) -> usize {
            1
        }
        fn supports_probability(&self) -> bool {
            true
        }
        fn classify(&self, _row: &[f64]) -> Result<RawPrediction> {
            Ok(RawPrediction {
                label: (self.0 > 0.5) as i64,
                positive_probability: Some(self.0),
            })
        }
    }

    #[test]
    fn test_fallback_law() {
        let positive = FallbackProbability::new(Box::new(FixedLabel(1)));
        let scored = positive.score(&[0.0]).unwrap();
        assert_eq!(scored.probability, 1.0);
        assert!(!scored.calibrated);

        let negative = FallbackProbability::new(Box::new(FixedLabel(0)));
        let scored = negative.score(&[0.0]).unwrap();
        assert_eq!(scored.probability, 0.0);
        assert!(!scored.calibrated);
    }

    #[test]
    fn test_model_probability_passes_through() {
        let wrapped: FallbackProbability<dyn Classifier> =
            FallbackProbability::new(Box::new(FixedProbability(0.73)));
        let scored = wrapped.score(&[0.0]).unwrap();
        assert_eq!(scored.label, 1);
        assert_eq!(scored.probability, 0.73);
        assert!(scored.calibrated);
    }
}
