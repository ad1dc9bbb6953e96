//! Failure-Risk Classification
//!
//! Wraps a trained model behind the [`Classifier`] trait: one reading in,
//! one [`ClassificationResult`] out. Models are loaded before use; nothing
//! here loads lazily.

mod engine;
mod onnx;
mod threshold;

pub use engine::{ClassificationResult, Classifier, RiskLabel};
pub use onnx::OnnxClassifier;
pub use threshold::{ThresholdClassifier, ThresholdConfig};

use thiserror::Error;

/// Errors during classification
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Unrecognized model output: {0}")]
    InvalidOutput(String),
    #[error("Invalid classifier configuration: {0}")]
    InvalidConfig(String),
}
