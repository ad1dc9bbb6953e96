//! Decision-and-Audit Pipeline
//!
//! Runs one reading through input collection, classification and audit
//! persistence, in that order, and reports how far it got.

use std::fmt;
use std::io::{BufRead, Write};

use inference_engine::{ClassificationResult, Classifier, InferenceError, RiskLabel};
use sensor_input::{InputError, Prompter, SensorReading};
use serde::Serialize;
use storage::{AuditRecord, AuditStore, PersistResult};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::presenter::Presenter;

/// Pipeline progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    CollectingInput,
    Classifying,
    Persisting,
    Done,
    Aborted,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Aborted)
    }

    /// Whether `next` directly follows this state
    pub fn can_advance_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (CollectingInput, Classifying)
                | (Classifying, Persisting)
                | (Persisting, Done)
                | (CollectingInput | Classifying | Persisting, Aborted)
        )
    }
}

/// How urgently a verdict needs attention, independent of how it is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Normal,
    Warning,
}

impl From<RiskLabel> for Severity {
    fn from(label: RiskLabel) -> Self {
        match label {
            RiskLabel::Normal => Severity::Normal,
            RiskLabel::Failing => Severity::Warning,
        }
    }
}

/// Classification outcome as shown to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub machine_id: String,
    pub classification: ClassificationResult,
    pub severity: Severity,
}

impl Verdict {
    pub fn new(reading: &SensorReading, classification: ClassificationResult) -> Self {
        Self {
            machine_id: reading.machine_id().to_string(),
            severity: classification.label.into(),
            classification,
        }
    }

    /// Operator-facing verdict line
    pub fn message(&self) -> String {
        match self.severity {
            Severity::Warning => format!("WARNING: Machine {} is likely to fail!", self.machine_id),
            Severity::Normal => format!(
                "Status OK: Machine {} is operating normally.",
                self.machine_id
            ),
        }
    }
}

/// Failure that ended a run early
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error("Input failed: {0}")]
    Input(#[from] InputError),
    #[error("Classification failed: {0}")]
    Classifier(#[from] InferenceError),
}

/// Final account of one run
#[derive(Debug)]
pub struct PipelineReport {
    pub state: PipelineState,
    pub reading: Option<SensorReading>,
    pub verdict: Option<Verdict>,
    pub persistence: Option<PersistResult>,
    pub failure: Option<StageFailure>,
}

impl PipelineReport {
    fn new() -> Self {
        Self {
            state: PipelineState::CollectingInput,
            reading: None,
            verdict: None,
            persistence: None,
            failure: None,
        }
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Pipeline transition");
        self.state = next;
    }

    /// One-line human-readable summary
    pub fn summary(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.verdict, &self.failure) {
            (Some(verdict), _) => write!(
                f,
                "Machine {}: {} ({:?})",
                verdict.machine_id,
                verdict.classification.label.as_str(),
                verdict.severity
            )?,
            (None, Some(failure)) => write!(f, "No verdict: {}", failure)?,
            (None, None) => write!(f, "No verdict")?,
        }

        match &self.persistence {
            Some(PersistResult::Success { row_id }) => write!(f, "; audit record {} committed", row_id),
            Some(PersistResult::NoRowsAffected) => write!(f, "; audit insert affected no rows"),
            Some(PersistResult::StoreError(detail)) => write!(f, "; audit store error: {}", detail),
            Some(PersistResult::UnexpectedError(detail)) => {
                write!(f, "; audit failed unexpectedly: {}", detail)
            }
            None => write!(f, "; not logged"),
        }
    }
}

/// Sequences input, classification and audit for a single reading
pub struct Pipeline<C> {
    classifier: C,
    store: AuditStore,
}

impl<C: Classifier> Pipeline<C> {
    pub fn new(classifier: C, store: AuditStore) -> Self {
        Self { classifier, store }
    }

    /// Process exactly one reading.
    ///
    /// Always returns a report in a terminal state. The verdict reaches the
    /// presenter before persistence starts, and a persistence failure still
    /// ends in [`PipelineState::Done`].
    pub async fn run<R, W, P>(
        &self,
        prompter: &mut Prompter<R, W>,
        presenter: &mut P,
    ) -> PipelineReport
    where
        R: BufRead,
        W: Write,
        P: Presenter,
    {
        let mut report = PipelineReport::new();

        let reading = match prompter.read_reading() {
            Ok(reading) => reading,
            Err(e) => return Self::abort(report, e.into(), presenter),
        };
        report.reading = Some(reading.clone());
        report.advance(PipelineState::Classifying);
        presenter.classifying(&reading);

        let classification = match self.classifier.classify(&reading) {
            Ok(classification) => classification,
            Err(e) => return Self::abort(report, e.into(), presenter),
        };
        info!(
            machine_id = reading.machine_id(),
            label = classification.label.as_str(),
            confidence = ?classification.confidence,
            "Reading classified"
        );

        let verdict = Verdict::new(&reading, classification.clone());
        presenter.verdict(&verdict);
        report.verdict = Some(verdict);

        report.advance(PipelineState::Persisting);
        presenter.persisting();
        let persistence = self
            .store
            .record(&AuditRecord::new(reading, classification))
            .await;
        presenter.persisted(&persistence);
        report.persistence = Some(persistence);

        report.advance(PipelineState::Done);
        info!("Pipeline finished: {}", report.summary());
        presenter.finished(&report);
        report
    }

    fn abort<P: Presenter>(
        mut report: PipelineReport,
        failure: StageFailure,
        presenter: &mut P,
    ) -> PipelineReport {
        error!(state = ?report.state, "Pipeline aborted: {}", failure);
        presenter.aborted(report.state, &failure);
        report.failure = Some(failure);
        report.advance(PipelineState::Aborted);
        presenter.finished(&report);
        report
    }
}
