//! Plain-text report layouts.

use std::fmt::Write;

use crate::dataset::LabelNames;
use crate::metrics::{AccuracyReport, ConfusionOutcome};

use super::LabelReport;

/// Per-label evaluation report: summary lines followed by the sweep table.
pub fn format_label_report(report: &LabelReport) -> String {
    let mut out = String::new();
    let accuracy = &report.accuracy;
    let _ = writeln!(out, "Positive label: {}", report.positive_label);
    let _ = writeln!(out, "Top-1 Error: {:.6}", accuracy.top1_error);
    let _ = writeln!(out, "Precision: {:.6}", accuracy.precision);
    let _ = writeln!(out, "Recall: {:.6}", accuracy.recall);
    let _ = writeln!(out, "Positive AP: {:.6}", report.average_precision);
    out.push_str("Thre\tPre \tRec \tF1 - score\n");
    for point in &report.sweep.points {
        let _ = writeln!(
            out,
            "{:.2}\t{:.4}\t{:.4}\t{:.4}",
            point.threshold, point.precision, point.recall, point.f1
        );
    }
    out
}

/// Service-mode report: hard metrics only, unrounded. Whole values keep
/// their decimal point (`1.0`).
pub fn format_service_report(report: &AccuracyReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Positive label: {}", report.positive_label);
    let _ = writeln!(out, "Top-1 Error: {:?}", report.top1_error);
    let _ = writeln!(out, "Precision: {:?}", report.precision);
    let _ = writeln!(out, "Recall: {:?}", report.recall);
    out
}

/// Tab-separated matrix (rows = predicted, columns = actual) and skip counts.
pub fn format_confusion_table(outcome: &ConfusionOutcome, names: Option<&LabelNames>) -> String {
    let matrix = &outcome.matrix;
    let name = |index: usize| match names {
        Some(names) => names.name(index),
        None => index.to_string(),
    };
    let mut out = String::from("predicted\\actual");
    for actual in 0..matrix.label_count() {
        out.push('\t');
        out.push_str(&name(actual));
    }
    out.push('\n');
    for (predicted, row) in matrix.rows().enumerate() {
        out.push_str(&name(predicted));
        for count in row {
            let _ = write!(out, "\t{count}");
        }
        out.push('\n');
    }
    let skipped = &outcome.skipped;
    let _ = writeln!(out, "Evaluated: {}", matrix.total());
    let _ = writeln!(out, "Missing Ground Truth: {}", skipped.missing_ground_truth);
    let _ = writeln!(out, "Malformed Predictions: {}", skipped.malformed_prediction);
    let _ = writeln!(out, "Out Of Range: {}", skipped.out_of_range);
    out
}
