//! Hard top-1 accuracy and positive-class precision/recall.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::dataset::{GroundTruthIndex, InferenceRecordStore};

use super::{MetricsError, SkipCounts};

/// Key added to captured error records.
pub const GROUND_TRUTH_KEY: &str = "Ground-truth Label";

/// Misclassified records keyed by image id.
pub type ErrorRecords = BTreeMap<String, Value>;

/// Outcome of a hard-decision evaluation for one positive label.
#[derive(Debug, Clone)]
pub struct AccuracyReport {
    pub positive_label: usize,
    pub top1_error: f64,
    pub precision: f64,
    pub recall: f64,
    /// Images compared against ground truth.
    pub evaluated: u64,
    /// Images whose top-1 matched ground truth, any class.
    pub correct: u64,
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub skipped: SkipCounts,
    /// Filled only when error capture was requested.
    pub error_records: ErrorRecords,
}

/// Evaluate the argmax decision of every record against ground truth.
///
/// Zero denominators are reported as errors instead of being smoothed.
pub fn evaluate(
    records: &InferenceRecordStore,
    ground_truth: &GroundTruthIndex,
    positive_label: usize,
    capture_errors: bool,
) -> Result<AccuracyReport, MetricsError> {
    let mut skipped = SkipCounts::default();
    let (mut total, mut correct, mut tp, mut fp, mut fn_) = (0u64, 0u64, 0u64, 0u64, 0u64);
    let mut error_records = ErrorRecords::new();

    for (image_id, record) in records.iter() {
        let Some(truth) = ground_truth.get(image_id) else {
            skipped.missing_ground_truth += 1;
            continue;
        };
        let predicted = match record.top1() {
            Ok(predicted) => predicted,
            Err(reason) => {
                tracing::warn!("Skipping {image_id} in accuracy: {reason}");
                skipped.malformed_prediction += 1;
                continue;
            }
        };
        total += 1;

        let misclassified = if predicted == truth {
            correct += 1;
            if predicted == positive_label {
                tp += 1;
            }
            false
        } else if predicted == positive_label {
            fp += 1;
            true
        } else if truth == positive_label {
            fn_ += 1;
            true
        } else {
            false
        };

        if misclassified && capture_errors {
            let mut entry = record.raw().clone();
            entry.insert(GROUND_TRUTH_KEY.to_string(), Value::from(truth));
            error_records.insert(image_id.to_string(), Value::Object(entry));
        }
    }

    tracing::info!("files: {}", records.len());
    tracing::info!("missing files: {}", skipped.missing_ground_truth);

    if total == 0 {
        return Err(MetricsError::NoEvaluatedImages);
    }
    if tp + fp == 0 {
        return Err(MetricsError::UndefinedPrecision { positive_label });
    }
    if tp + fn_ == 0 {
        return Err(MetricsError::UndefinedRecall { positive_label });
    }

    Ok(AccuracyReport {
        positive_label,
        top1_error: 1.0 - correct as f64 / total as f64,
        precision: tp as f64 / (tp + fp) as f64,
        recall: tp as f64 / (tp + fn_) as f64,
        evaluated: total,
        correct,
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
        skipped,
        error_records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> (InferenceRecordStore, GroundTruthIndex) {
        let records = InferenceRecordStore::from_value(json!({
            "tp.jpg": {"Top-1 Index": 1, "Confidence": [0.2, 0.8]},
            "fp.jpg": {"Top-1 Index": [1], "Confidence": [0.3, 0.7]},
            "fn.jpg": {"Top-1 Index": 0, "Confidence": [0.6, 0.4]},
            "tn.jpg": {"Top-1 Index": 0, "Confidence": [0.9, 0.1]},
            "tp2.jpg": {"Top-1 Index": 1, "Confidence": [0.1, 0.9]},
            "missing.jpg": {"Top-1 Index": 1, "Confidence": [0.1, 0.9]},
        }))
        .unwrap();
        let truth =
            GroundTruthIndex::parse("tp.jpg 1\nfp.jpg 0\nfn.jpg 1\ntn.jpg 0\ntp2.jpg 1\n").unwrap();
        (records, truth)
    }

    #[test]
    fn computes_error_precision_and_recall() {
        let (records, truth) = fixture();
        let report = evaluate(&records, &truth, 1, false).unwrap();
        assert_eq!(report.evaluated, 5);
        assert_eq!(report.correct, 3);
        assert_eq!(report.skipped.missing_ground_truth, 1);
        assert!((report.top1_error - 0.4).abs() < 1e-12);
        assert!((report.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!(report.error_records.is_empty());
    }

    #[test]
    fn captures_false_positives_and_negatives() {
        let (records, truth) = fixture();
        let report = evaluate(&records, &truth, 1, true).unwrap();
        let ids: Vec<&str> = report.error_records.keys().map(String::as_str).collect();
        assert_eq!(ids, ["fn.jpg", "fp.jpg"]);
        assert_eq!(report.error_records["fp.jpg"][GROUND_TRUTH_KEY], json!(0));
        assert_eq!(report.error_records["fp.jpg"]["Top-1 Index"], json!([1]));
    }

    #[test]
    fn other_class_confusions_are_not_captured() {
        let records = InferenceRecordStore::from_value(json!({
            "a.jpg": {"Top-1 Index": 2},
            "b.jpg": {"Top-1 Index": 1},
            "c.jpg": {"Top-1 Index": 0},
        }))
        .unwrap();
        let truth = GroundTruthIndex::parse("a.jpg 0\nb.jpg 1\nc.jpg 1\n").unwrap();
        let report = evaluate(&records, &truth, 1, true).unwrap();
        assert_eq!(report.error_records.len(), 1);
        assert!(report.error_records.contains_key("c.jpg"));
    }

    #[test]
    fn absent_positive_class_is_an_error() {
        let records = InferenceRecordStore::from_value(json!({
            "a.jpg": {"Top-1 Index": 0},
        }))
        .unwrap();
        let truth = GroundTruthIndex::parse("a.jpg 0\n").unwrap();
        assert!(matches!(
            evaluate(&records, &truth, 1, false),
            Err(MetricsError::UndefinedPrecision { positive_label: 1 })
        ));
    }

    #[test]
    fn never_predicted_positive_with_positives_present_fails_precision() {
        let records = InferenceRecordStore::from_value(json!({
            "a.jpg": {"Top-1 Index": 0},
        }))
        .unwrap();
        let truth = GroundTruthIndex::parse("a.jpg 1\n").unwrap();
        assert!(matches!(
            evaluate(&records, &truth, 1, false),
            Err(MetricsError::UndefinedPrecision { .. })
        ));
    }

    #[test]
    fn no_overlap_with_ground_truth_is_an_error() {
        let records = InferenceRecordStore::from_value(json!({
            "a.jpg": {"Top-1 Index": 0},
        }))
        .unwrap();
        let truth = GroundTruthIndex::parse("b.jpg 0\n").unwrap();
        assert!(matches!(
            evaluate(&records, &truth, 0, false),
            Err(MetricsError::NoEvaluatedImages)
        ));
    }

    #[test]
    fn malformed_top1_is_excluded_from_total() {
        let records = InferenceRecordStore::from_value(json!({
            "a.jpg": {"Top-1 Index": 1},
            "b.jpg": {"Top-1 Index": [0, 1]},
        }))
        .unwrap();
        let truth = GroundTruthIndex::parse("a.jpg 1\nb.jpg 1\n").unwrap();
        let report = evaluate(&records, &truth, 1, false).unwrap();
        assert_eq!(report.evaluated, 1);
        assert_eq!(report.skipped.malformed_prediction, 1);
        assert_eq!(report.top1_error, 0.0);
    }
}
