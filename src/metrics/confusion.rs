//! Confusion matrix over hard predictions.

use crate::dataset::{GroundTruthIndex, InferenceRecordStore};

use super::{MetricsError, SkipCounts};

/// Square `label_count × label_count` counts indexed `[predicted][actual]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    label_count: usize,
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    fn new(label_count: usize) -> Self {
        Self {
            label_count,
            counts: vec![0; label_count * label_count],
        }
    }

    fn increment(&mut self, predicted: usize, actual: usize) {
        let idx = predicted * self.label_count + actual;
        self.counts[idx] = self.counts[idx].saturating_add(1);
    }

    pub fn label_count(&self) -> usize {
        self.label_count
    }

    pub fn get(&self, predicted: usize, actual: usize) -> u64 {
        self.counts[predicted * self.label_count + actual]
    }

    /// Row `predicted`: counts per actual label.
    pub fn row(&self, predicted: usize) -> &[u64] {
        let start = predicted * self.label_count;
        &self.counts[start..start + self.label_count]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        self.counts.chunks(self.label_count.max(1))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn max_cell(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Matrix plus the records that could not be placed in it.
#[derive(Debug, Clone)]
pub struct ConfusionOutcome {
    pub matrix: ConfusionMatrix,
    pub skipped: SkipCounts,
}

/// Count every record present in both inputs at `[predicted][actual]`.
///
/// `top_k` selects which `Top-<k> Index` field provides the prediction; its
/// highest-ranked entry is used. Records that cannot be placed are logged and
/// counted rather than aborting the pass.
pub fn build(
    records: &InferenceRecordStore,
    ground_truth: &GroundTruthIndex,
    label_count: usize,
    top_k: usize,
) -> Result<ConfusionOutcome, MetricsError> {
    if label_count == 0 {
        return Err(MetricsError::EmptyLabelSet);
    }
    let mut matrix = ConfusionMatrix::new(label_count);
    let mut skipped = SkipCounts::default();
    for (image_id, record) in records.iter() {
        let Some(actual) = ground_truth.get(image_id) else {
            tracing::error!("{image_id} not found in ground-truth file");
            skipped.missing_ground_truth += 1;
            continue;
        };
        let predicted = match record.predicted_at(top_k) {
            Ok(predicted) => predicted,
            Err(reason) => {
                tracing::warn!("Skipping {image_id} in confusion matrix: {reason}");
                skipped.malformed_prediction += 1;
                continue;
            }
        };
        if predicted >= label_count || actual >= label_count {
            tracing::warn!(
                "Skipping {image_id} in confusion matrix: predicted {predicted} / actual {actual} outside {label_count} labels"
            );
            skipped.out_of_range += 1;
            continue;
        }
        matrix.increment(predicted, actual);
    }
    tracing::debug!("Confusion matrix built over {} images", matrix.total());
    Ok(ConfusionOutcome { matrix, skipped })
}
