//! Metric computation over an inference log and its ground truth.
//!
//! Every function takes the positive label explicitly; nothing here keeps state
//! between calls, so all-labels runs simply call them once per label.

pub mod accuracy;
pub mod average_precision;
pub mod confusion;
pub mod sweep;

use thiserror::Error;

pub use accuracy::{AccuracyReport, ErrorRecords, GROUND_TRUTH_KEY, evaluate};
pub use average_precision::average_precision;
pub use confusion::{ConfusionMatrix, ConfusionOutcome, build as build_confusion_matrix};
pub use sweep::{CurvePoint, ThresholdSweep, sweep};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("cannot integrate an empty precision/recall curve")]
    EmptyCurve,
    #[error("recall and precision lengths differ ({recall} vs {precision})")]
    LengthMismatch { recall: usize, precision: usize },
    #[error("no image in the log has a ground-truth entry")]
    NoEvaluatedImages,
    #[error("precision undefined for label {positive_label}: it was never predicted")]
    UndefinedPrecision { positive_label: usize },
    #[error("recall undefined for label {positive_label}: it never occurs in ground truth")]
    UndefinedRecall { positive_label: usize },
    #[error("confusion matrix needs at least one label")]
    EmptyLabelSet,
}

/// Records left out of a pass, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipCounts {
    pub missing_ground_truth: u64,
    pub malformed_prediction: u64,
    pub missing_confidence: u64,
    pub out_of_range: u64,
}

impl SkipCounts {
    pub fn total(&self) -> u64 {
        self.missing_ground_truth
            + self.malformed_prediction
            + self.missing_confidence
            + self.out_of_range
    }
}
