//! Classifier Contract

use crate::InferenceError;
use sensor_input::SensorReading;
use serde::{Deserialize, Serialize};

/// Failure-risk category assigned to a reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLabel {
    /// Machine is operating normally
    Normal,
    /// Machine is likely to fail
    Failing,
}

impl RiskLabel {
    /// Integer code stored in the audit log
    pub fn code(&self) -> i64 {
        match self {
            RiskLabel::Normal => 0,
            RiskLabel::Failing => 1,
        }
    }

    /// Map a model or database label code back to a label
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RiskLabel::Normal),
            1 => Some(RiskLabel::Failing),
            _ => None,
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLabel::Normal => "normal",
            RiskLabel::Failing => "failing",
        }
    }
}

/// Outcome of classifying one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Predicted risk category
    pub label: RiskLabel,
    /// Model score for the predicted label, when the model reports one
    pub confidence: Option<f64>,
}

impl ClassificationResult {
    pub fn new(label: RiskLabel, confidence: Option<f64>) -> Self {
        Self { label, confidence }
    }
}

/// A loaded, ready-to-use classification capability.
///
/// Implementations must be deterministic: the same reading always yields the
/// same result.
pub trait Classifier {
    fn classify(&self, reading: &SensorReading) -> Result<ClassificationResult, InferenceError>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn classify(&self, reading: &SensorReading) -> Result<ClassificationResult, InferenceError> {
        (**self).classify(reading)
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn classify(&self, reading: &SensorReading) -> Result<ClassificationResult, InferenceError> {
        (**self).classify(reading)
    }
}
