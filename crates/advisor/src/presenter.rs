//! Operator-facing rendering of pipeline events

use std::io::Write;

use colored::Colorize;
use sensor_input::{InputError, SensorReading};
use storage::PersistResult;
use tracing::warn;

use crate::pipeline::{PipelineReport, PipelineState, Severity, StageFailure, Verdict};

/// Receives pipeline events as they happen
pub trait Presenter {
    /// A complete reading was collected and is about to be classified
    fn classifying(&mut self, reading: &SensorReading);
    /// Classification produced a verdict
    fn verdict(&mut self, verdict: &Verdict);
    /// The audit write is starting
    fn persisting(&mut self);
    /// The audit write finished
    fn persisted(&mut self, result: &PersistResult);
    /// The run stopped early in `state`
    fn aborted(&mut self, state: PipelineState, failure: &StageFailure);
    /// The run reached a terminal state
    fn finished(&mut self, report: &PipelineReport);
}

/// Line tone, mapped to a color when color output is enabled
#[derive(Debug, Clone, Copy)]
enum Tone {
    Plain,
    Ok,
    Alert,
    Fault,
}

/// Renders pipeline events as console text
pub struct ConsolePresenter<W> {
    out: W,
    color: bool,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, tone: Tone, text: &str) {
        let rendered = if self.color {
            match tone {
                Tone::Plain => text.normal(),
                Tone::Ok => text.green(),
                Tone::Alert => text.bright_red(),
                Tone::Fault => text.red(),
            }
            .to_string()
        } else {
            text.to_string()
        };

        if let Err(e) = writeln!(self.out, "{}", rendered) {
            warn!("Failed to write operator output: {}", e);
        }
    }
}

impl<W: Write> Presenter for ConsolePresenter<W> {
    fn classifying(&mut self, _reading: &SensorReading) {
        self.line(Tone::Plain, "\nChecking status...");
    }

    fn verdict(&mut self, verdict: &Verdict) {
        let classification = &verdict.classification;
        self.line(
            Tone::Plain,
            &format!("\nPrediction Result: {}", classification.label.code()),
        );
        if let Some(confidence) = classification.confidence {
            self.line(Tone::Plain, &format!("Confidence: {:.2}", confidence));
        }

        let tone = match verdict.severity {
            Severity::Warning => Tone::Alert,
            Severity::Normal => Tone::Ok,
        };
        self.line(tone, &verdict.message());
    }

    fn persisting(&mut self) {
        self.line(Tone::Plain, "\nLogging prediction to database...");
    }

    fn persisted(&mut self, result: &PersistResult) {
        match result {
            PersistResult::Success { .. } => self.line(
                Tone::Plain,
                "Log successfully inserted and committed to the audit database.",
            ),
            PersistResult::NoRowsAffected => {
                self.line(Tone::Fault, "Failed to insert log into database.")
            }
            PersistResult::StoreError(detail) => {
                self.line(Tone::Fault, &format!("Database Error: {}", detail))
            }
            PersistResult::UnexpectedError(detail) => self.line(
                Tone::Fault,
                &format!("An unexpected error occurred: {}", detail),
            ),
        }
    }

    fn aborted(&mut self, _state: PipelineState, failure: &StageFailure) {
        match failure {
            StageFailure::Input(InputError::Closed { .. }) => self.line(
                Tone::Fault,
                "\nInput ended before a complete reading was entered. Nothing was classified.",
            ),
            StageFailure::Input(InputError::Io(e)) => self.line(
                Tone::Fault,
                &format!("\nCould not read operator input: {}. Nothing was classified.", e),
            ),
            StageFailure::Classifier(e) => self.line(
                Tone::Fault,
                &format!("\nClassification failed: {}. Prediction was not logged.", e),
            ),
        }
    }

    fn finished(&mut self, report: &PipelineReport) {
        self.line(Tone::Plain, &format!("\nSummary: {}", report.summary()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine::{ClassificationResult, InferenceError, RiskLabel};

    fn verdict(label: RiskLabel, confidence: Option<f64>) -> Verdict {
        let reading = SensorReading::new(Some("M7".to_string()), 95.0, 6.1, 5000.0, 120.0);
        Verdict::new(&reading, ClassificationResult::new(label, confidence))
    }

    fn render(f: impl FnOnce(&mut ConsolePresenter<Vec<u8>>)) -> String {
        let mut presenter = ConsolePresenter::new(Vec::new(), false);
        f(&mut presenter);
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_failing_verdict_lines() {
        let output = render(|p| p.verdict(&verdict(RiskLabel::Failing, Some(0.875))));

        assert!(output.contains("Prediction Result: 1"));
        assert!(output.contains("Confidence: 0.88"));
        assert!(output.contains("WARNING: Machine M7 is likely to fail!"));
    }

    #[test]
    fn test_normal_verdict_without_confidence() {
        let output = render(|p| p.verdict(&verdict(RiskLabel::Normal, None)));

        assert!(output.contains("Prediction Result: 0"));
        assert!(!output.contains("Confidence"));
        assert!(output.contains("Status OK: Machine M7 is operating normally."));
    }

    #[test]
    fn test_persistence_messages_are_distinct() {
        let results = [
            PersistResult::Success { row_id: 4 },
            PersistResult::NoRowsAffected,
            PersistResult::StoreError("disk I/O error".to_string()),
            PersistResult::UnexpectedError("decode failed".to_string()),
        ];
        let outputs: Vec<String> = results
            .iter()
            .map(|result| render(|p| p.persisted(result)))
            .collect();

        assert!(outputs[0].starts_with("Log successfully inserted"));
        assert_eq!(outputs[1], "Failed to insert log into database.\n");
        assert_eq!(outputs[2], "Database Error: disk I/O error\n");
        assert_eq!(outputs[3], "An unexpected error occurred: decode failed\n");
    }

    #[test]
    fn test_classifier_abort_message() {
        let failure = StageFailure::Classifier(InferenceError::InferenceFailed("oom".to_string()));
        let output = render(|p| p.aborted(PipelineState::Classifying, &failure));

        assert!(output.contains("Classification failed: Inference failed: oom."));
        assert!(output.contains("Prediction was not logged."));
    }

    #[test]
    fn test_input_abort_messages_are_distinct() {
        let closed = StageFailure::Input(InputError::Closed {
            field: "temperature",
        });
        let output = render(|p| p.aborted(PipelineState::CollectingInput, &closed));
        assert!(output.contains("Input ended before a complete reading was entered."));

        let broken = StageFailure::Input(InputError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "terminal detached",
        )));
        let output = render(|p| p.aborted(PipelineState::CollectingInput, &broken));
        assert!(output.contains("Could not read operator input: Operator channel error: terminal detached."));
        assert!(!output.contains("Input ended"));
    }

    #[test]
    fn test_color_wraps_warning() {
        colored::control::set_override(true);
        let mut presenter = ConsolePresenter::new(Vec::new(), true);
        presenter.verdict(&verdict(RiskLabel::Failing, None));
        let output = String::from_utf8(presenter.into_inner()).unwrap();

        assert!(output.contains("\u{1b}["));
        assert!(output.contains("WARNING: Machine M7 is likely to fail!"));
    }
}
