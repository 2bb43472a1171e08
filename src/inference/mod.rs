//! Classifier adapters for leaf disease prediction.

mod classifier;
mod onnx;

pub use classifier::{
    Classification, FixedClassifier, ImageClassifier, rank_scores, softmax, sort_by_confidence,
    top_classification,
};
pub use onnx::OnnxClassifier;
