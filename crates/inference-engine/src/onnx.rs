//! ONNX Model Classifier

use std::path::{Path, PathBuf};

use crate::engine::{ClassificationResult, Classifier, RiskLabel};
use crate::InferenceError;
use sensor_input::SensorReading;
use tracing::{debug, info};
use tract_onnx::prelude::*;

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Number of model input features
const FEATURE_COUNT: usize = 4;

/// Classifier backed by an ONNX model, loaded and optimized up front.
///
/// The model takes one `f32` row of `[temperature, vibration, hours_run,
/// pressure]`. Its first output is read as either an `i64` label code, a
/// single `f32` failure probability, or one `f32` score per label.
pub struct OnnxClassifier {
    model: OnnxPlan,
    model_path: PathBuf,
}

impl OnnxClassifier {
    /// Load and optimize the model at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading ONNX model: {}", path.display());

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| {
                model.with_input_fact(0, f32::fact([1, FEATURE_COUNT]).into())
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| InferenceError::ModelLoadError(format!("{}: {}", path.display(), e)))?;

        info!("Model loaded successfully");
        Ok(Self {
            model,
            model_path: path.to_path_buf(),
        })
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn input_tensor(reading: &SensorReading) -> Result<Tensor, InferenceError> {
        let features = reading
            .measurements()
            .iter()
            .map(|v| to_feature(*v))
            .collect::<Result<Vec<f32>, _>>()?;
        let array = tract_ndarray::Array2::from_shape_vec((1, FEATURE_COUNT), features)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;
        Ok(array.into())
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, reading: &SensorReading) -> Result<ClassificationResult, InferenceError> {
        let start = std::time::Instant::now();
        let input = Self::input_tensor(reading)?;

        let outputs = self
            .model
            .run(tvec!(input.into()))
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::InvalidOutput("model produced no outputs".to_string()))?;
        let result = interpret_output(output)?;

        debug!(
            "Inference completed in {}ms: {:?}",
            start.elapsed().as_millis(),
            result
        );
        Ok(result)
    }
}

/// Narrow a measurement to the model's `f32` input, refusing values that
/// would saturate to infinity
fn to_feature(value: f64) -> Result<f32, InferenceError> {
    let feature = value as f32;
    if feature.is_finite() {
        Ok(feature)
    } else {
        Err(InferenceError::InferenceFailed(format!(
            "measurement {} is out of range for the model input",
            value
        )))
    }
}

/// Map the model's first output tensor to a classification
fn interpret_output(output: &Tensor) -> Result<ClassificationResult, InferenceError> {
    if let Ok(codes) = output.to_array_view::<i64>() {
        let code = codes
            .iter()
            .next()
            .copied()
            .ok_or_else(|| InferenceError::InvalidOutput("empty label tensor".to_string()))?;
        return label_from_code(code).map(|label| ClassificationResult::new(label, None));
    }

    let scores: Vec<f32> = output
        .to_array_view::<f32>()
        .map_err(|e| InferenceError::InvalidOutput(e.to_string()))?
        .iter()
        .copied()
        .collect();
    result_from_scores(&scores)
}

fn label_from_code(code: i64) -> Result<RiskLabel, InferenceError> {
    RiskLabel::from_code(code)
        .ok_or_else(|| InferenceError::InvalidOutput(format!("unknown label code {}", code)))
}

/// Interpret a probability or per-label score vector. The reported
/// confidence is the model's score, unmodified.
fn result_from_scores(scores: &[f32]) -> Result<ClassificationResult, InferenceError> {
    if let Some(bad) = scores.iter().find(|score| !score.is_finite()) {
        return Err(InferenceError::InvalidOutput(format!(
            "model produced non-finite score {}",
            bad
        )));
    }

    match scores {
        [] => Err(InferenceError::InvalidOutput("empty score tensor".to_string())),
        [failure] => {
            let label = if *failure >= 0.5 {
                RiskLabel::Failing
            } else {
                RiskLabel::Normal
            };
            Ok(ClassificationResult::new(label, Some(f64::from(*failure))))
        }
        _ => {
            let (index, best) = scores
                .iter()
                .enumerate()
                .fold((0, f32::MIN), |acc, (i, &score)| {
                    if score > acc.1 {
                        (i, score)
                    } else {
                        acc
                    }
                });
            let label = label_from_code(index as i64)?;
            Ok(ClassificationResult::new(label, Some(f64::from(best))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_fails_to_load() {
        let err = OnnxClassifier::load("/nonexistent/model.onnx").err().unwrap();
        assert!(matches!(err, InferenceError::ModelLoadError(_)));
    }

    #[test]
    fn test_single_probability_output() {
        let result = result_from_scores(&[0.75]).unwrap();
        assert_eq!(result.label, RiskLabel::Failing);
        assert_eq!(result.confidence, Some(0.75));

        let result = result_from_scores(&[0.25]).unwrap();
        assert_eq!(result.label, RiskLabel::Normal);
        assert_eq!(result.confidence, Some(0.25));
    }

    #[test]
    fn test_non_finite_scores_rejected() {
        for scores in [
            vec![f32::NAN],
            vec![f32::NAN, f32::NAN],
            vec![0.25, f32::INFINITY],
            vec![f32::NEG_INFINITY, 0.5],
        ] {
            assert!(
                matches!(
                    result_from_scores(&scores),
                    Err(InferenceError::InvalidOutput(_))
                ),
                "{scores:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_label_code_output() {
        let result = interpret_output(&tensor1(&[1i64])).unwrap();
        assert_eq!(result.label, RiskLabel::Failing);
        assert_eq!(result.confidence, None);

        let result = interpret_output(&tensor1(&[0i64])).unwrap();
        assert_eq!(result.label, RiskLabel::Normal);

        assert!(matches!(
            interpret_output(&tensor1(&[7i64])),
            Err(InferenceError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_score_tensor_output() {
        let result = interpret_output(&tensor2(&[[0.125f32, 0.875]])).unwrap();
        assert_eq!(result.label, RiskLabel::Failing);
        assert_eq!(result.confidence, Some(0.875));

        assert!(matches!(
            interpret_output(&tensor2(&[[f32::NAN]])),
            Err(InferenceError::InvalidOutput(_))
        ));
        assert!(matches!(
            interpret_output(&tensor1(&[1.0f64])),
            Err(InferenceError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_oversized_measurement_rejected() {
        let reading = SensorReading::new(Some("M7".to_string()), 1e300, 6.1, 5000.0, 120.0);
        assert!(matches!(
            OnnxClassifier::input_tensor(&reading),
            Err(InferenceError::InferenceFailed(_))
        ));

        let reading = SensorReading::new(Some("M7".to_string()), 95.0, 6.1, 5000.0, 120.0);
        let tensor = OnnxClassifier::input_tensor(&reading).unwrap();
        assert_eq!(tensor.shape(), &[1, FEATURE_COUNT]);
    }

    #[test]
    fn test_per_label_scores() {
        let result = result_from_scores(&[0.125, 0.875]).unwrap();
        assert_eq!(result.label, RiskLabel::Failing);
        assert_eq!(result.confidence, Some(0.875));

        let result = result_from_scores(&[0.5, 0.25]).unwrap();
        assert_eq!(result.label, RiskLabel::Normal);
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!(matches!(
            result_from_scores(&[0.1, 0.1, 0.8]),
            Err(InferenceError::InvalidOutput(_))
        ));
        assert!(result_from_scores(&[]).is_err());
    }
}
