//! Conversion of online-service logs into the inference log shape.
//!
//! Service logs only carry the hard label, so converted records have a
//! `Top-1 Index` and a null `Confidence`.

use serde_json::{Map, Value, json};
use thiserror::Error;

use super::records::CONFIDENCE_KEY;

#[derive(Debug, Error)]
pub enum ServiceLogError {
    #[error("Service log root must be a JSON object")]
    NotAnObject,
    #[error("No service label found for {image_id}")]
    MissingLabel { image_id: String },
}

/// Known service log schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceFlavor {
    /// `{"pulp": {"fileList": [{"result": {"label": n}}]}}`
    Pulp,
    /// `{"fileList": [{"label": n}]}`
    Nrop,
}

impl ServiceFlavor {
    fn label_of<'a>(self, entry: &'a Value) -> Option<&'a Value> {
        match self {
            ServiceFlavor::Pulp => entry
                .get("pulp")?
                .get("fileList")?
                .get(0)?
                .get("result")?
                .get("label"),
            ServiceFlavor::Nrop => entry.get("fileList")?.get(0)?.get("label"),
        }
    }
}

/// Convert a parsed service log into an inference log object.
pub fn convert(log: &Value, flavor: ServiceFlavor) -> Result<Value, ServiceLogError> {
    let entries = log.as_object().ok_or(ServiceLogError::NotAnObject)?;
    let mut out = Map::with_capacity(entries.len());
    for (image_id, entry) in entries {
        let label = flavor
            .label_of(entry)
            .filter(|label| !label.is_null())
            .ok_or_else(|| ServiceLogError::MissingLabel {
                image_id: image_id.clone(),
            })?;
        out.insert(
            image_id.clone(),
            json!({
                "Top-1 Index": label.clone(),
                "File Name": image_id,
                "Top-1 Class": Value::Null,
                CONFIDENCE_KEY: Value::Null,
            }),
        );
    }
    Ok(Value::Object(out))
}
