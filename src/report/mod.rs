//! Report sink: where computed curves, tables and error logs end up.
//!
//! The metric engine never touches the filesystem; the runner hands results to
//! a [`ReportSink`]. [`DirectoryReportSink`] lays them out under one output
//! directory with a subdirectory per positive label.

mod plot;
mod sink;
mod text;

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::LabelNames;
use crate::metrics::{AccuracyReport, ConfusionOutcome, ErrorRecords, ThresholdSweep};

pub use plot::{render_curve, render_heatmap};
pub use sink::{
    CONFUSION_IMAGE_FILE_NAME, CONFUSION_TABLE_FILE_NAME, DirectoryReportSink,
    ERROR_LOG_FILE_NAME, RESULT_FILE_NAME,
};
pub use text::{format_confusion_table, format_label_report, format_service_report};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode image {path}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Curves produced by each threshold sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// Precision (y) against recall (x).
    PrecisionRecall,
    /// F1 score (y) against threshold (x).
    F1Threshold,
}

impl CurveKind {
    pub fn file_name(self, positive_label: usize) -> String {
        match self {
            CurveKind::PrecisionRecall => format!("pr-{positive_label}.png"),
            CurveKind::F1Threshold => format!("f1-{positive_label}.png"),
        }
    }
}

/// Everything computed for one positive label.
#[derive(Debug, Clone)]
pub struct LabelReport {
    pub positive_label: usize,
    pub sweep: ThresholdSweep,
    pub accuracy: AccuracyReport,
    pub average_precision: f64,
}

/// Consumer of evaluation results.
pub trait ReportSink {
    /// Make room for a label's outputs. Must be idempotent.
    fn prepare_label(&mut self, positive_label: usize) -> Result<(), ReportError>;

    fn curve(
        &mut self,
        positive_label: usize,
        kind: CurveKind,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<(), ReportError>;

    fn label_report(&mut self, report: &LabelReport) -> Result<(), ReportError>;

    fn error_log(
        &mut self,
        positive_label: usize,
        errors: &ErrorRecords,
    ) -> Result<(), ReportError>;

    fn confusion(
        &mut self,
        outcome: &ConfusionOutcome,
        names: Option<&LabelNames>,
    ) -> Result<(), ReportError>;

    fn service_report(&mut self, report: &AccuracyReport) -> Result<(), ReportError>;
}
