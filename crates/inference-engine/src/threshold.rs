//! Rule-Based Threshold Classifier

use crate::engine::{ClassificationResult, Classifier, RiskLabel};
use crate::InferenceError;
use sensor_input::SensorReading;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Limits above which a measurement counts as abnormal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Temperature limit (default: 90.0)
    pub temperature_max: f64,
    /// Vibration limit (default: 5.0)
    pub vibration_max: f64,
    /// Hours-run limit (default: 4000.0)
    pub hours_run_max: f64,
    /// Pressure limit (default: 130.0)
    pub pressure_max: f64,
    /// Abnormal measurements needed for a Failing verdict (default: 2)
    pub min_exceeded: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temperature_max: 90.0,
            vibration_max: 5.0,
            hours_run_max: 4000.0,
            pressure_max: 130.0,
            min_exceeded: 2,
        }
    }
}

impl ThresholdConfig {
    fn limits(&self) -> [f64; 4] {
        [
            self.temperature_max,
            self.vibration_max,
            self.hours_run_max,
            self.pressure_max,
        ]
    }
}

/// Deterministic rule model used when no trained model file is configured
#[derive(Debug, Clone)]
pub struct ThresholdClassifier {
    config: ThresholdConfig,
}

impl ThresholdClassifier {
    /// Create a classifier, rejecting non-finite limits and impossible
    /// exceed counts
    pub fn new(config: ThresholdConfig) -> Result<Self, InferenceError> {
        if config.limits().iter().any(|limit| !limit.is_finite()) {
            return Err(InferenceError::InvalidConfig(
                "threshold limits must be finite".to_string(),
            ));
        }
        if config.min_exceeded == 0 || config.min_exceeded > 4 {
            return Err(InferenceError::InvalidConfig(format!(
                "min_exceeded must be between 1 and 4, got {}",
                config.min_exceeded
            )));
        }

        info!("Creating threshold classifier: {:?}", config);
        Ok(Self { config })
    }
}

impl Classifier for ThresholdClassifier {
    fn classify(&self, reading: &SensorReading) -> Result<ClassificationResult, InferenceError> {
        let exceeded = reading
            .measurements()
            .iter()
            .zip(self.config.limits())
            .filter(|(value, limit)| **value > *limit)
            .count();

        // Confidence tracks how far the reading sits from the decision boundary
        let (label, confidence) = if exceeded >= self.config.min_exceeded {
            (RiskLabel::Failing, (0.5 + 0.125 * exceeded as f64).min(0.99))
        } else {
            (RiskLabel::Normal, (0.95 - 0.2 * exceeded as f64).max(0.5))
        };

        debug!(
            machine_id = reading.machine_id(),
            exceeded,
            label = label.as_str(),
            "Threshold classification"
        );

        Ok(ClassificationResult::new(label, Some(confidence)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reading(t: f64, v: f64, h: f64, p: f64) -> SensorReading {
        SensorReading::new(Some("M7".to_string()), t, v, h, p)
    }

    #[test]
    fn test_overheating_machine_is_failing() {
        let classifier = ThresholdClassifier::new(ThresholdConfig::default()).unwrap();
        let result = classifier.classify(&reading(95.0, 6.1, 5000.0, 120.0)).unwrap();

        assert_eq!(result.label, RiskLabel::Failing);
        assert!(result.confidence.unwrap() > 0.5);
    }

    #[test]
    fn test_healthy_machine_is_normal() {
        let classifier = ThresholdClassifier::new(ThresholdConfig::default()).unwrap();
        let result = classifier.classify(&reading(85.5, 4.2, 3450.0, 115.8)).unwrap();

        assert_eq!(result.label, RiskLabel::Normal);
        assert_eq!(result.confidence, Some(0.95));
    }

    #[test]
    fn test_single_exceeded_limit_is_normal() {
        let classifier = ThresholdClassifier::new(ThresholdConfig::default()).unwrap();
        let result = classifier.classify(&reading(99.0, 1.0, 10.0, 100.0)).unwrap();
        assert_eq!(result.label, RiskLabel::Normal);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ThresholdConfig {
            pressure_max: f64::NAN,
            ..Default::default()
        };
        assert!(ThresholdClassifier::new(config).is_err());

        let config = ThresholdConfig {
            min_exceeded: 0,
            ..Default::default()
        };
        assert!(ThresholdClassifier::new(config).is_err());
    }

    proptest! {
        #[test]
        fn prop_classification_is_deterministic(
            t in -100.0f64..300.0,
            v in 0.0f64..20.0,
            h in 0.0f64..20000.0,
            p in 0.0f64..300.0,
        ) {
            let classifier = ThresholdClassifier::new(ThresholdConfig::default()).unwrap();
            let input = reading(t, v, h, p);
            let first = classifier.classify(&input).unwrap();
            let second = classifier.classify(&input).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
