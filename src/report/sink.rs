use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::dataset::LabelNames;
use crate::metrics::{AccuracyReport, ConfusionOutcome, ErrorRecords};

use super::plot::{render_curve, render_heatmap};
use super::text::{format_confusion_table, format_label_report, format_service_report};
use super::{CurveKind, LabelReport, ReportError, ReportSink};

/// Per-label text report file name.
pub const RESULT_FILE_NAME: &str = "result";
/// Per-label misclassified-image log.
pub const ERROR_LOG_FILE_NAME: &str = "err_img.json";
pub const CONFUSION_IMAGE_FILE_NAME: &str = "confusion_matrix.png";
pub const CONFUSION_TABLE_FILE_NAME: &str = "confusion_matrix.txt";

/// Writes reports under `root`, one subdirectory per positive label.
#[derive(Debug, Clone)]
pub struct DirectoryReportSink {
    root: PathBuf,
}

impl DirectoryReportSink {
    /// Create the sink, creating `root` if it does not exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn label_dir(&self, positive_label: usize) -> PathBuf {
        self.root.join(positive_label.to_string())
    }
}

impl ReportSink for DirectoryReportSink {
    fn prepare_label(&mut self, positive_label: usize) -> Result<(), ReportError> {
        let dir = self.label_dir(positive_label);
        let existed = dir.is_dir();
        ensure_dir(&dir)?;
        if !existed {
            tracing::info!("{} created", dir.display());
        }
        Ok(())
    }

    fn curve(
        &mut self,
        positive_label: usize,
        kind: CurveKind,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<(), ReportError> {
        let path = self
            .label_dir(positive_label)
            .join(kind.file_name(positive_label));
        render_curve(xs, ys)
            .save(&path)
            .map_err(|source| ReportError::Image {
                path: path.clone(),
                source,
            })?;
        tracing::debug!("Curve saved to {}", path.display());
        Ok(())
    }

    fn label_report(&mut self, report: &LabelReport) -> Result<(), ReportError> {
        let path = self
            .label_dir(report.positive_label)
            .join(RESULT_FILE_NAME);
        write_text(&path, &format_label_report(report))
    }

    fn error_log(
        &mut self,
        positive_label: usize,
        errors: &ErrorRecords,
    ) -> Result<(), ReportError> {
        let path = self
            .label_dir(positive_label)
            .join(ERROR_LOG_FILE_NAME);
        let file = File::create(&path).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        errors
            .serialize(&mut serializer)
            .map_err(|source| ReportError::Json {
                path: path.clone(),
                source,
            })?;
        writer.flush().map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!("{} error images saved to {}", errors.len(), path.display());
        Ok(())
    }

    fn confusion(
        &mut self,
        outcome: &ConfusionOutcome,
        names: Option<&LabelNames>,
    ) -> Result<(), ReportError> {
        let table_path = self.root.join(CONFUSION_TABLE_FILE_NAME);
        write_text(&table_path, &format_confusion_table(outcome, names))?;
        let image_path = self.root.join(CONFUSION_IMAGE_FILE_NAME);
        if let Err(source) = render_heatmap(&outcome.matrix).save(&image_path) {
            tracing::warn!("Drawing confusion matrix failed: {source}");
            for row in outcome.matrix.rows() {
                tracing::info!("{row:?}");
            }
            return Err(ReportError::Image {
                path: image_path,
                source,
            });
        }
        Ok(())
    }

    fn service_report(&mut self, report: &AccuracyReport) -> Result<(), ReportError> {
        let path = self
            .label_dir(report.positive_label)
            .join(RESULT_FILE_NAME);
        write_text(&path, &format_service_report(report))
    }
}

/// Create `path` and its parents; existing directories are left untouched.
pub(crate) fn ensure_dir(path: &Path) -> Result<(), ReportError> {
    std::fs::create_dir_all(path).map_err(|source| ReportError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text(path: &Path, text: &str) -> Result<(), ReportError> {
    std::fs::write(path, text).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{GroundTruthIndex, InferenceRecordStore};
    use crate::metrics::{build_confusion_matrix, evaluate};
    use serde_json::json;
    use tempfile::tempdir;

    fn fixture() -> (InferenceRecordStore, GroundTruthIndex) {
        let records = InferenceRecordStore::from_value(json!({
            "a.jpg": {"Top-1 Index": 1, "Confidence": [0.2, 0.8]},
            "b.jpg": {"Top-1 Index": 0, "Confidence": [0.7, 0.3]},
            "c.jpg": {"Top-1 Index": 1, "Confidence": [0.4, 0.6]},
        }))
        .unwrap();
        let truth = GroundTruthIndex::parse("a.jpg 1\nb.jpg 1\nc.jpg 0\n").unwrap();
        (records, truth)
    }

    #[test]
    fn prepare_label_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut sink = DirectoryReportSink::new(dir.path().join("out")).unwrap();
        sink.prepare_label(3).unwrap();
        sink.prepare_label(3).unwrap();
        assert!(dir.path().join("out").join("3").is_dir());
    }

    #[test]
    fn error_log_is_keyed_by_image() {
        let dir = tempdir().unwrap();
        let (records, truth) = fixture();
        let report = evaluate(&records, &truth, 1, true).unwrap();
        let mut sink = DirectoryReportSink::new(dir.path()).unwrap();
        sink.prepare_label(1).unwrap();
        sink.error_log(1, &report.error_records).unwrap();

        let bytes = std::fs::read(sink.label_dir(1).join(ERROR_LOG_FILE_NAME)).unwrap();
        let saved: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(saved["b.jpg"]["Ground-truth Label"], json!(1));
        assert_eq!(saved["c.jpg"]["Ground-truth Label"], json!(0));
        assert!(saved.get("a.jpg").is_none());
    }

    #[test]
    fn confusion_outputs_table_and_image() {
        let dir = tempdir().unwrap();
        let (records, truth) = fixture();
        let outcome = build_confusion_matrix(&records, &truth, 2, 1).unwrap();
        let mut sink = DirectoryReportSink::new(dir.path()).unwrap();
        sink.confusion(&outcome, None).unwrap();
        assert!(dir.path().join(CONFUSION_IMAGE_FILE_NAME).is_file());
        let table = std::fs::read_to_string(dir.path().join(CONFUSION_TABLE_FILE_NAME)).unwrap();
        assert!(table.starts_with("predicted\\actual\t0\t1\n"));
    }

    #[test]
    fn curves_are_png_files() {
        let dir = tempdir().unwrap();
        let mut sink = DirectoryReportSink::new(dir.path()).unwrap();
        sink.prepare_label(0).unwrap();
        sink.curve(0, CurveKind::PrecisionRecall, &[1.0, 0.5], &[0.5, 1.0])
            .unwrap();
        let path = sink.label_dir(0).join("pr-0.png");
        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), super::super::plot::CURVE_WIDTH);
    }
}
