//! Turning the classifier's raw class scores into a decision.
use crate::error::*;
use crate::Result;
use serde::Serialize;
use snafu::ensure;

/// Probability the most likely class must exceed to be reported
pub const DEFAULT_THRESHOLD: f32 = 0.80;

/// The outcome of thresholding a score vector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// Index of the most likely class, or `None` if no class was likely enough
    pub class: Option<usize>,

    /// Softmax probability of the most likely class
    pub probability: f32,
}

impl Prediction {
    /// The class index, with `-1` standing in for "no confident class"
    pub fn class_or_sentinel(&self) -> i64 {
        self.class.map_or(-1, |class| class as i64)
    }
}

/// Check that `threshold` is a probability, between 0 and 1 inclusive.
pub fn validate_threshold(threshold: f32) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&threshold),
        InvalidThresholdSnafu { threshold }
    );

    Ok(())
}

/// Convert raw scores into probabilities that sum to 1.
///
/// If any score is NaN or positive infinity, or every score is negative infinity, every
/// probability is NaN.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    // Subtracting the max doesn't change the result but keeps `exp` from overflowing
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps = scores.iter().map(|score| (score - max).exp()).collect::<Vec<_>>();
    let sum = exps.iter().sum::<f32>();

    exps.into_iter().map(|exp| exp / sum).collect()
}

/// Report the most likely class if its probability is greater than `threshold`.
///
/// Scores that don't produce a probability distribution (empty, or NaN after softmax) yield no
/// class with probability 0.
pub fn threshold_softmax(scores: &[f32], threshold: f32) -> Prediction {
    let probabilities = softmax(scores);
    if probabilities.iter().any(|probability| probability.is_nan()) {
        return Prediction {
            class: None,
            probability: 0.0,
        };
    }

    let best = probabilities
        .into_iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (class, probability)| {
            match best {
                Some((_, best_probability)) if best_probability >= probability => best,
                _ => Some((class, probability)),
            }
        });

    match best {
        Some((class, probability)) if probability > threshold => Prediction {
            class: Some(class),
            probability,
        },
        Some((_, probability)) => Prediction {
            class: None,
            probability,
        },
        None => Prediction {
            class: None,
            probability: 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BertokenError;
    use assert_matches::assert_matches;

    #[test]
    fn softmax_sums_to_one() {
        let probabilities = softmax(&[1.0, 2.0, 3.0]);

        assert!((probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probabilities[2] > probabilities[1] && probabilities[1] > probabilities[0]);
    }

    #[test]
    fn softmax_handles_large_scores() {
        let probabilities = softmax(&[1000.0, 1000.0]);
        assert_eq!(vec![0.5, 0.5], probabilities);
    }

    #[test]
    fn confident_class_is_reported() {
        let prediction = threshold_softmax(&[0.1, 6.0, 0.3], DEFAULT_THRESHOLD);

        assert_eq!(Some(1), prediction.class);
        assert_eq!(1, prediction.class_or_sentinel());
        assert!(prediction.probability > 0.99);
    }

    #[test]
    fn uncertain_scores_give_no_class() {
        let prediction = threshold_softmax(&[1.0, 1.2, 0.9], DEFAULT_THRESHOLD);

        assert_eq!(None, prediction.class);
        assert_eq!(-1, prediction.class_or_sentinel());
    }

    #[test]
    fn probability_equal_to_threshold_is_not_enough() {
        let prediction = threshold_softmax(&[0.0, 0.0], 0.5);
        assert_eq!(None, prediction.class);
        assert_eq!(0.5, prediction.probability);
    }

    #[test]
    fn scores_without_a_distribution_give_no_class() {
        let none = Prediction {
            class: None,
            probability: 0.0,
        };

        assert_eq!(none, threshold_softmax(&[1.0, f32::NAN, 2.0], 0.5));
        assert_eq!(
            none,
            threshold_softmax(&[f32::NEG_INFINITY, f32::NEG_INFINITY], 0.0)
        );
        assert!(softmax(&[f32::NEG_INFINITY, f32::NEG_INFINITY])
            .iter()
            .all(|probability| probability.is_nan()));
    }

    #[test]
    fn threshold_must_be_a_probability() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(DEFAULT_THRESHOLD).is_ok());
        assert!(validate_threshold(1.0).is_ok());

        for threshold in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            assert_matches!(
                validate_threshold(threshold),
                Err(BertokenError::InvalidThreshold { .. })
            );
        }
    }

    #[test]
    fn empty_scores() {
        assert_eq!(
            Prediction {
                class: None,
                probability: 0.0
            },
            threshold_softmax(&[], DEFAULT_THRESHOLD)
        );
    }
}
