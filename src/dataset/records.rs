//! In-memory view of a JSON inference log.
//!
//! Each record carries one or more `Top-<k> Index` fields and an optional
//! `Confidence` vector indexed by class id. Index fields are classified once
//! here into [`Prediction`] values so evaluators never inspect JSON shapes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// Key of the confidence vector inside a record.
pub const CONFIDENCE_KEY: &str = "Confidence";

static TOP_K_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Top-(\d+) Index$").expect("static regex"));

/// Errors raised while loading an inference log.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Failed to read inference log {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid inference log JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The log root must be an object keyed by image id.
    #[error("Inference log root must be a JSON object")]
    NotAnObject,
}

/// Field name holding the ranked predictions at `depth`.
pub fn top_k_key(depth: usize) -> String {
    format!("Top-{depth} Index")
}

/// Predicted class indices at one top-k depth, validated at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prediction {
    /// Non-empty class indices ordered by descending confidence.
    Ranked(Vec<usize>),
    /// The field had a shape that cannot be read as class indices.
    Malformed(String),
}

impl Prediction {
    fn classify(depth: usize, value: &Value) -> Self {
        match value {
            Value::Number(_) => match as_index(value) {
                Some(index) => Prediction::Ranked(vec![index]),
                None => Prediction::Malformed(format!("not a class index: {value}")),
            },
            Value::Array(items) if items.is_empty() => {
                Prediction::Malformed("empty index sequence".to_string())
            }
            Value::Array(items) if depth == 1 && items.len() != 1 => Prediction::Malformed(
                format!("expected a single top-1 index, got {} entries", items.len()),
            ),
            Value::Array(items) => {
                let indices: Option<Vec<usize>> = items.iter().map(as_index).collect();
                match indices {
                    Some(indices) => Prediction::Ranked(indices),
                    None => Prediction::Malformed(format!("non-integer index in {value}")),
                }
            }
            other => Prediction::Malformed(format!("unsupported index value {other}")),
        }
    }

    /// Highest-ranked class index.
    pub fn head(&self) -> Result<usize, &str> {
        match self {
            Prediction::Ranked(indices) => indices.first().copied().ok_or("empty prediction"),
            Prediction::Malformed(reason) => Err(reason.as_str()),
        }
    }
}

fn as_index(value: &Value) -> Option<usize> {
    value.as_u64().and_then(|v| usize::try_from(v).ok())
}

/// One parsed inference record.
#[derive(Debug, Clone)]
pub struct InferenceRecord {
    predictions: BTreeMap<usize, Prediction>,
    confidence: Option<Vec<f64>>,
    raw: Map<String, Value>,
}

impl InferenceRecord {
    fn from_value(value: Value) -> Self {
        let raw = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let mut predictions = BTreeMap::new();
        for (key, value) in &raw {
            let Some(depth) = TOP_K_KEY
                .captures(key)
                .and_then(|caps| caps[1].parse::<usize>().ok())
            else {
                continue;
            };
            predictions.insert(depth, Prediction::classify(depth, value));
        }
        let confidence = raw
            .get(CONFIDENCE_KEY)
            .and_then(Value::as_array)
            .and_then(|items| items.iter().map(Value::as_f64).collect());
        Self {
            predictions,
            confidence,
            raw,
        }
    }

    /// Prediction stored under `Top-<depth> Index`, if present.
    pub fn prediction(&self, depth: usize) -> Option<&Prediction> {
        self.predictions.get(&depth)
    }

    /// Head of the prediction at `depth`, or the reason it cannot be used.
    pub fn predicted_at(&self, depth: usize) -> Result<usize, String> {
        match self.predictions.get(&depth) {
            Some(prediction) => prediction.head().map_err(str::to_string),
            None => Err(format!("missing `{}` field", top_k_key(depth))),
        }
    }

    /// Hard top-1 decision.
    pub fn top1(&self) -> Result<usize, String> {
        self.predicted_at(1)
    }

    pub fn confidence(&self) -> Option<&[f64]> {
        self.confidence.as_deref()
    }

    /// Score for `label`, if the confidence vector covers it.
    pub fn confidence_for(&self, label: usize) -> Option<f64> {
        self.confidence.as_ref().and_then(|scores| scores.get(label).copied())
    }

    /// Original JSON fields as read from the log.
    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

/// Read a JSON document from disk.
pub fn read_json(path: &Path) -> Result<Value, RecordStoreError> {
    let bytes = std::fs::read(path).map_err(|source| RecordStoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Parsed inference log keyed by image id, read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct InferenceRecordStore {
    records: BTreeMap<String, InferenceRecord>,
}

impl InferenceRecordStore {
    pub fn load(path: &Path) -> Result<Self, RecordStoreError> {
        let store = Self::from_value(read_json(path)?)?;
        tracing::debug!("Loaded {} inference records from {}", store.len(), path.display());
        Ok(store)
    }

    pub fn from_json(text: &str) -> Result<Self, RecordStoreError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self, RecordStoreError> {
        let Value::Object(entries) = value else {
            return Err(RecordStoreError::NotAnObject);
        };
        let records = entries
            .into_iter()
            .map(|(image_id, value)| (image_id, InferenceRecord::from_value(value)))
            .collect();
        Ok(Self { records })
    }

    pub fn get(&self, image_id: &str) -> Option<&InferenceRecord> {
        self.records.get(image_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in image id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InferenceRecord)> {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }
}
