//! Evaluation inputs: ground truth, inference logs and label names.

pub mod ground_truth;
pub mod labels;
pub mod records;
pub mod service_log;

pub use ground_truth::{GroundTruthError, GroundTruthIndex};
pub use labels::{LabelNames, LabelNamesError};
pub use records::{InferenceRecord, InferenceRecordStore, Prediction, RecordStoreError};
pub use service_log::{ServiceFlavor, ServiceLogError};
