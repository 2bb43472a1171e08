//! Classifier adapter contract and ranking helpers.

use crate::constants::confidence;
use crate::error::{Error, Result};
use image::DynamicImage;

/// A single ranked label.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Class label as listed in the labels file.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f32,
}

impl Classification {
    /// Create a classification result.
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// A pretrained image classifier.
///
/// Implementations return results ordered by descending confidence and are
/// called from blocking worker threads, never from the pipeline task.
pub trait ImageClassifier: Send + Sync {
    /// Classify a normalized image.
    fn classify(&self, image: &DynamicImage) -> Result<Vec<Classification>>;
}

/// Take the highest-ranked result.
pub fn top_classification(results: Vec<Classification>) -> Result<Classification> {
    results.into_iter().next().ok_or(Error::NoPrediction)
}

/// Classifier that always returns the same ranked list.
///
/// Used for dry runs and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedClassifier {
    results: Vec<Classification>,
}

impl FixedClassifier {
    /// Create a classifier returning `results`, re-sorted by confidence.
    pub fn new(mut results: Vec<Classification>) -> Self {
        sort_by_confidence(&mut results);
        Self { results }
    }
}

impl ImageClassifier for FixedClassifier {
    fn classify(&self, _image: &DynamicImage) -> Result<Vec<Classification>> {
        Ok(self.results.clone())
    }
}

/// Sort results by descending confidence; NaN scores sink to the end.
pub fn sort_by_confidence(results: &mut [Classification]) {
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or_else(|| a.confidence.is_nan().cmp(&b.confidence.is_nan()))
    });
}

/// Pair raw scores with labels and keep the `top_k` best.
///
/// Scores beyond the label list are reported as `class_<index>`.
pub fn rank_scores(scores: &[f32], labels: &[String], top_k: usize) -> Vec<Classification> {
    let mut ranked: Vec<Classification> = scores
        .iter()
        .enumerate()
        .map(|(index, &score)| {
            let label = labels
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("class_{index}"));
            Classification::new(label, score.clamp(confidence::MIN, confidence::MAX))
        })
        .collect();
    sort_by_confidence(&mut ranked);
    ranked.truncate(top_k);
    ranked
}

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_top_classification_takes_first() {
        let top = top_classification(vec![
            Classification::new("Healthy", 0.92),
            Classification::new("Blight", 0.05),
        ])
        .unwrap();
        assert_eq!(top.label, "Healthy");
        assert_eq!(top.confidence, 0.92);
    }

    #[test]
    fn test_top_classification_empty_is_no_prediction() {
        assert!(matches!(
            top_classification(Vec::new()),
            Err(Error::NoPrediction)
        ));
    }

    #[test]
    fn test_fixed_classifier_orders_results() {
        let classifier = FixedClassifier::new(vec![
            Classification::new("Blight", 0.05),
            Classification::new("Healthy", 0.92),
        ]);
        let image = DynamicImage::new_rgb8(1, 1);
        let results = classifier.classify(&image).unwrap();
        assert_eq!(results[0].label, "Healthy");
        assert_eq!(results[1].label, "Blight");
    }

    #[test]
    fn test_rank_scores_keeps_top_k() {
        let ranked = rank_scores(
            &[0.1, 0.6, 0.3],
            &labels(&["Rust", "Healthy", "Mildew"]),
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].label, "Healthy");
        assert_eq!(ranked[1].label, "Mildew");
    }

    #[test]
    fn test_rank_scores_unlabelled_index() {
        let ranked = rank_scores(&[0.2, 0.8], &labels(&["Healthy"]), 5);
        assert_eq!(ranked[0].label, "class_1");
    }

    #[test]
    fn test_sort_puts_nan_last() {
        let mut results = vec![
            Classification::new("nan", f32::NAN),
            Classification::new("low", 0.1),
            Classification::new("high", 0.9),
        ];
        sort_by_confidence(&mut results);
        assert_eq!(results[0].label, "high");
        assert_eq!(results[2].label, "nan");
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[2.0, 1.0, 0.1]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probs[0] > probs[1] && probs[1] > probs[2]);
    }
}
