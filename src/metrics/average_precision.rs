//! Step-interpolated average precision.

use super::MetricsError;

/// Integrate a precision/recall curve given in sweep order.
///
/// Index 0 is the lowest threshold (highest recall), so recall normally
/// decreases along the input:
///
/// `AP = r[n-1]·p[n-1] + Σ_{i≥1} min(p[i], p[i-1]) · (r[i-1] − r[i])`
pub fn average_precision(recall: &[f64], precision: &[f64]) -> Result<f64, MetricsError> {
    if recall.len() != precision.len() {
        return Err(MetricsError::LengthMismatch {
            recall: recall.len(),
            precision: precision.len(),
        });
    }
    let (Some(&last_recall), Some(&last_precision)) = (recall.last(), precision.last()) else {
        return Err(MetricsError::EmptyCurve);
    };
    let steps: f64 = (1..recall.len())
        .map(|i| precision[i].min(precision[i - 1]) * (recall[i - 1] - recall[i]))
        .sum();
    Ok(last_recall * last_precision + steps)
}
