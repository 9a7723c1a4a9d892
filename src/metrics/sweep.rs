//! Threshold sweep over the positive-class confidence score.
//!
//! Thresholds are `i / 100` for `i = 1..=99`. A record counts as positive at a
//! threshold when its positive-class score is strictly greater than it.

use crate::dataset::{GroundTruthIndex, InferenceRecordStore};

use super::average_precision::average_precision;
use super::{MetricsError, SkipCounts};

/// Number of thresholds on the sweep grid.
pub const THRESHOLD_STEPS: usize = 99;

/// Substitute for `fp` and `fn` when either denominator would be zero.
pub const DEGENERATE_EPSILON: f64 = 1e-8;

/// Threshold grid in increasing order.
pub fn thresholds() -> impl Iterator<Item = f64> {
    (1..=THRESHOLD_STEPS).map(|i| i as f64 / 100.0)
}

/// Metrics at one threshold, with the counts that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
}

impl CurvePoint {
    fn from_counts(threshold: f64, tp: u64, fp: u64, fn_: u64) -> Self {
        let tp_f = tp as f64;
        let (mut fp_f, mut fn_f) = (fp as f64, fn_ as f64);
        if tp + fp == 0 || tp + fn_ == 0 {
            fp_f = DEGENERATE_EPSILON;
            fn_f = DEGENERATE_EPSILON;
        }
        Self {
            threshold,
            precision: tp_f / (tp_f + fp_f),
            recall: tp_f / (tp_f + fn_f),
            f1: 2.0 * tp_f / (2.0 * tp_f + fp_f + fn_f),
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
        }
    }
}

/// Result of sweeping one positive label.
#[derive(Debug, Clone)]
pub struct ThresholdSweep {
    pub positive_label: usize,
    /// Ordered by strictly increasing threshold.
    pub points: Vec<CurvePoint>,
    pub skipped: SkipCounts,
}

impl ThresholdSweep {
    pub fn thresholds(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.threshold).collect()
    }

    pub fn precisions(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.precision).collect()
    }

    pub fn recalls(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.recall).collect()
    }

    pub fn f1_scores(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.f1).collect()
    }

    /// AP of this curve, integrated in threshold order.
    pub fn average_precision(&self) -> Result<f64, MetricsError> {
        average_precision(&self.recalls(), &self.precisions())
    }
}

/// Sweep the decision threshold for `positive_label` across the whole log.
///
/// Images absent from `ground_truth` are skipped silently. Records whose
/// confidence vector does not cover `positive_label` are skipped with a warning.
pub fn sweep(
    records: &InferenceRecordStore,
    ground_truth: &GroundTruthIndex,
    positive_label: usize,
) -> ThresholdSweep {
    let mut skipped = SkipCounts::default();
    let mut scored: Vec<(f64, bool)> = Vec::with_capacity(records.len());
    for (image_id, record) in records.iter() {
        let Some(truth) = ground_truth.get(image_id) else {
            skipped.missing_ground_truth += 1;
            continue;
        };
        let Some(score) = record.confidence_for(positive_label) else {
            tracing::warn!(
                "No confidence for label {positive_label} on {image_id}; skipped in threshold sweep"
            );
            skipped.missing_confidence += 1;
            continue;
        };
        scored.push((score, truth == positive_label));
    }

    let points = thresholds()
        .map(|threshold| {
            let (mut tp, mut fp, mut fn_) = (0u64, 0u64, 0u64);
            for &(score, is_positive) in &scored {
                match (score > threshold, is_positive) {
                    (true, true) => tp += 1,
                    (true, false) => fp += 1,
                    (false, true) => fn_ += 1,
                    (false, false) => {}
                }
            }
            CurvePoint::from_counts(threshold, tp, fp, fn_)
        })
        .collect();

    ThresholdSweep {
        positive_label,
        points,
        skipped,
    }
}
