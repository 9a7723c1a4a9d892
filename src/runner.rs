//! One evaluation pass: load inputs once, compute, hand results to a sink.

use std::time::Instant;

use thiserror::Error;

use crate::config::{EvalSettings, RunMode};
use crate::dataset::records::read_json;
use crate::dataset::{
    GroundTruthError, GroundTruthIndex, InferenceRecordStore, LabelNames, LabelNamesError,
    RecordStoreError, ServiceFlavor, ServiceLogError, service_log,
};
use crate::metrics::{
    self, AccuracyReport, ConfusionOutcome, MetricsError, build_confusion_matrix, sweep,
};
use crate::report::{CurveKind, DirectoryReportSink, LabelReport, ReportError, ReportSink};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    GroundTruth(#[from] GroundTruthError),
    #[error(transparent)]
    Records(#[from] RecordStoreError),
    #[error(transparent)]
    ServiceLog(#[from] ServiceLogError),
    #[error(transparent)]
    LabelNames(#[from] LabelNamesError),
    #[error("label {positive_label}: {source}")]
    Metrics {
        positive_label: usize,
        source: MetricsError,
    },
    #[error("confusion matrix: {0}")]
    Confusion(MetricsError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Inputs of one run, read-only for its whole duration.
#[derive(Debug, Clone)]
pub struct Evaluation {
    ground_truth: GroundTruthIndex,
    records: InferenceRecordStore,
}

impl Evaluation {
    pub fn new(ground_truth: GroundTruthIndex, records: InferenceRecordStore) -> Self {
        Self {
            ground_truth,
            records,
        }
    }

    /// Load ground truth and the inference log named by `settings`,
    /// converting service logs first when the mode asks for it.
    pub fn load(settings: &EvalSettings) -> Result<Self, RunError> {
        let ground_truth = GroundTruthIndex::load(&settings.ground_truth)?;
        let records = match settings.mode {
            RunMode::Service { flavor, .. } => load_service_log(settings, flavor)?,
            _ => InferenceRecordStore::load(&settings.in_log)?,
        };
        tracing::debug!("log successfully loaded");
        Ok(Self::new(ground_truth, records))
    }

    pub fn ground_truth(&self) -> &GroundTruthIndex {
        &self.ground_truth
    }

    pub fn records(&self) -> &InferenceRecordStore {
        &self.records
    }

    /// Sweep, AP, hard metrics and reports for one positive label.
    pub fn run_label(
        &self,
        positive_label: usize,
        capture_errors: bool,
        sink: &mut dyn ReportSink,
    ) -> Result<LabelReport, RunError> {
        let metrics_error = |source| RunError::Metrics {
            positive_label,
            source,
        };
        sink.prepare_label(positive_label)?;

        let sweep = sweep(&self.records, &self.ground_truth, positive_label);
        let average_precision = sweep.average_precision().map_err(metrics_error)?;
        sink.curve(
            positive_label,
            CurveKind::PrecisionRecall,
            &sweep.recalls(),
            &sweep.precisions(),
        )?;
        sink.curve(
            positive_label,
            CurveKind::F1Threshold,
            &sweep.thresholds(),
            &sweep.f1_scores(),
        )?;

        let accuracy = metrics::evaluate(
            &self.records,
            &self.ground_truth,
            positive_label,
            capture_errors,
        )
        .map_err(metrics_error)?;
        if capture_errors {
            sink.error_log(positive_label, &accuracy.error_records)?;
        }

        let report = LabelReport {
            positive_label,
            sweep,
            accuracy,
            average_precision,
        };
        sink.label_report(&report)?;
        tracing::info!(
            "label {positive_label}: top-1 error {:.6}, AP {:.6}",
            report.accuracy.top1_error,
            report.average_precision
        );
        Ok(report)
    }

    /// Evaluate labels `0..label_range` one after another.
    pub fn run_all_labels(
        &self,
        label_range: usize,
        capture_errors: bool,
        sink: &mut dyn ReportSink,
    ) -> Result<Vec<LabelReport>, RunError> {
        let mut reports = Vec::with_capacity(label_range);
        for positive_label in 0..label_range {
            tracing::info!("positive label: {positive_label}");
            reports.push(self.run_label(positive_label, capture_errors, sink)?);
        }
        Ok(reports)
    }

    /// Hard-decision metrics only; service logs carry no confidence.
    pub fn run_service(
        &self,
        positive_label: usize,
        capture_errors: bool,
        sink: &mut dyn ReportSink,
    ) -> Result<AccuracyReport, RunError> {
        sink.prepare_label(positive_label)?;
        let report = metrics::evaluate(
            &self.records,
            &self.ground_truth,
            positive_label,
            capture_errors,
        )
        .map_err(|source| RunError::Metrics {
            positive_label,
            source,
        })?;
        if capture_errors {
            sink.error_log(positive_label, &report.error_records)?;
        }
        sink.service_report(&report)?;
        Ok(report)
    }

    pub fn run_confusion(
        &self,
        label_count: usize,
        top_k: usize,
        names: Option<&LabelNames>,
        sink: &mut dyn ReportSink,
    ) -> Result<ConfusionOutcome, RunError> {
        let outcome = build_confusion_matrix(&self.records, &self.ground_truth, label_count, top_k)
            .map_err(RunError::Confusion)?;
        if outcome.skipped.total() > 0 {
            tracing::warn!(
                "confusion matrix skipped {} images ({} missing ground truth, {} malformed, {} out of range)",
                outcome.skipped.total(),
                outcome.skipped.missing_ground_truth,
                outcome.skipped.malformed_prediction,
                outcome.skipped.out_of_range
            );
        }
        sink.confusion(&outcome, names)?;
        Ok(outcome)
    }
}

fn load_service_log(
    settings: &EvalSettings,
    flavor: ServiceFlavor,
) -> Result<InferenceRecordStore, RunError> {
    let raw = read_json(&settings.in_log)?;
    let converted = service_log::convert(&raw, flavor)?;
    Ok(InferenceRecordStore::from_value(converted)?)
}

/// Log the resolved settings the way each run starts.
pub fn log_settings(settings: &EvalSettings) {
    let rule = "=".repeat(80);
    tracing::info!("{rule}");
    tracing::info!("Arguments submitted:");
    for (key, value) in settings.summary() {
        tracing::info!("{key:<20}= {value}");
    }
    tracing::info!("{rule}");
}

/// Execute the run described by `settings`, writing under its output path.
pub fn run(settings: &EvalSettings) -> Result<(), RunError> {
    let started = Instant::now();
    log_settings(settings);
    tracing::info!("Start evaluation job...");
    let evaluation = Evaluation::load(settings)?;
    let mut sink = DirectoryReportSink::new(&settings.out_path)?;

    match settings.mode {
        RunMode::SingleLabel { positive_label } => {
            evaluation.run_label(positive_label, settings.err_log, &mut sink)?;
        }
        RunMode::AllLabels { label_range } => {
            evaluation.run_all_labels(label_range, settings.err_log, &mut sink)?;
        }
        RunMode::Service { positive_label, .. } => {
            evaluation.run_service(positive_label, settings.err_log, &mut sink)?;
        }
    }

    if settings.conf_mat {
        let names = settings
            .label_file
            .as_deref()
            .map(LabelNames::load)
            .transpose()?;
        let label_count = names
            .as_ref()
            .map(LabelNames::len)
            .filter(|&count| count > 0)
            .or(settings.label_range)
            .unwrap_or(0);
        evaluation.run_confusion(label_count, settings.top_k, names.as_ref(), &mut sink)?;
    }

    tracing::info!("...done in {:.3}s", started.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn evaluation() -> Evaluation {
        let records = InferenceRecordStore::from_value(json!({
            "a.jpg": {"Top-1 Index": 1, "Confidence": [0.2, 0.8]},
            "b.jpg": {"Top-1 Index": 0, "Confidence": [0.7, 0.3]},
            "c.jpg": {"Top-1 Index": 1, "Confidence": [0.4, 0.6]},
            "d.jpg": {"Top-1 Index": 0, "Confidence": [0.9, 0.1]},
        }))
        .unwrap();
        let truth = GroundTruthIndex::parse("a.jpg 1\nb.jpg 1\nc.jpg 0\nd.jpg 0\n").unwrap();
        Evaluation::new(truth, records)
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl ReportSink for Recorder {
        fn prepare_label(&mut self, label: usize) -> Result<(), ReportError> {
            self.events.push(format!("prepare {label}"));
            Ok(())
        }

        fn curve(
            &mut self,
            label: usize,
            kind: CurveKind,
            xs: &[f64],
            ys: &[f64],
        ) -> Result<(), ReportError> {
            assert_eq!(xs.len(), ys.len());
            self.events.push(kind.file_name(label));
            Ok(())
        }

        fn label_report(&mut self, report: &LabelReport) -> Result<(), ReportError> {
            self.events.push(format!("report {}", report.positive_label));
            Ok(())
        }

        fn error_log(
            &mut self,
            label: usize,
            errors: &metrics::ErrorRecords,
        ) -> Result<(), ReportError> {
            self.events.push(format!("errors {label} {}", errors.len()));
            Ok(())
        }

        fn confusion(
            &mut self,
            outcome: &ConfusionOutcome,
            _names: Option<&LabelNames>,
        ) -> Result<(), ReportError> {
            self.events.push(format!("confusion {}", outcome.matrix.total()));
            Ok(())
        }

        fn service_report(&mut self, report: &AccuracyReport) -> Result<(), ReportError> {
            self.events.push(format!("service {}", report.positive_label));
            Ok(())
        }
    }

    #[test]
    fn label_run_emits_outputs_in_order() {
        let mut sink = Recorder::default();
        evaluation().run_label(1, true, &mut sink).unwrap();
        assert_eq!(
            sink.events,
            ["prepare 1", "pr-1.png", "f1-1.png", "errors 1 2", "report 1"]
        );
    }

    #[test]
    fn error_log_is_skipped_unless_requested() {
        let mut sink = Recorder::default();
        evaluation().run_label(0, false, &mut sink).unwrap();
        assert!(!sink.events.iter().any(|e| e.starts_with("errors")));
    }

    #[test]
    fn all_labels_runs_each_label_once() {
        let mut sink = Recorder::default();
        let reports = evaluation().run_all_labels(2, false, &mut sink).unwrap();
        assert_eq!(reports.len(), 2);
        let reported: Vec<&String> = sink
            .events
            .iter()
            .filter(|e| e.starts_with("report"))
            .collect();
        assert_eq!(reported, ["report 0", "report 1"]);
    }

    #[test]
    fn undefined_precision_names_the_label() {
        let mut sink = Recorder::default();
        let err = evaluation().run_label(5, false, &mut sink).unwrap_err();
        assert!(matches!(
            err,
            RunError::Metrics {
                positive_label: 5,
                source: MetricsError::UndefinedPrecision { .. }
            }
        ));
    }

    #[test]
    fn service_run_reports_hard_metrics() {
        let mut sink = Recorder::default();
        let report = evaluation().run_service(1, false, &mut sink).unwrap();
        assert_eq!(report.evaluated, 4);
        assert_eq!(sink.events, ["prepare 1", "service 1"]);
    }
}
