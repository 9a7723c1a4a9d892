//! Ground-truth list loader.
//!
//! The list file holds one `<path-or-filename> <label-index>` record per line.
//! Only the basename of the first token is kept so that keys match inference
//! logs regardless of the directory layout they were produced under.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors raised while loading a ground-truth list.
#[derive(Debug, Error)]
pub enum GroundTruthError {
    /// Failed to read the list file.
    #[error("Failed to read ground-truth list {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A line could not be parsed into `<image> <label>`.
    #[error("Malformed ground-truth record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
    /// The same image basename appeared twice.
    #[error("Duplicate ground-truth entry for {image_id} at line {line}")]
    DuplicateImage { line: usize, image_id: String },
}

/// Image basename to label index mapping, read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct GroundTruthIndex {
    labels: BTreeMap<String, usize>,
}

impl GroundTruthIndex {
    /// Load and parse a ground-truth list from disk.
    pub fn load(path: &Path) -> Result<Self, GroundTruthError> {
        let text = std::fs::read_to_string(path).map_err(|source| GroundTruthError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let index = Self::parse(&text)?;
        tracing::debug!(
            "Loaded {} ground-truth entries from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Parse list text. Blank lines are ignored; duplicates are rejected.
    pub fn parse(text: &str) -> Result<Self, GroundTruthError> {
        let mut labels = BTreeMap::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let mut tokens = raw.split_whitespace();
            let Some(first) = tokens.next() else {
                continue;
            };
            let Some(label_token) = tokens.next() else {
                return Err(GroundTruthError::Malformed {
                    line,
                    reason: format!("expected `<image> <label>`, got `{}`", raw.trim()),
                });
            };
            let label = label_token
                .parse::<usize>()
                .map_err(|err| GroundTruthError::Malformed {
                    line,
                    reason: format!("invalid label `{label_token}`: {err}"),
                })?;
            let image_id = basename(first).to_string();
            if labels.contains_key(&image_id) {
                return Err(GroundTruthError::DuplicateImage { line, image_id });
            }
            labels.insert(image_id, label);
        }
        Ok(Self { labels })
    }

    pub fn get(&self, image_id: &str) -> Option<usize> {
        self.labels.get(image_id).copied()
    }

    pub fn contains(&self, image_id: &str) -> bool {
        self.labels.contains_key(image_id)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate entries in image id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.labels.iter().map(|(id, label)| (id.as_str(), *label))
    }
}

impl FromIterator<(String, usize)> for GroundTruthIndex {
    fn from_iter<T: IntoIterator<Item = (String, usize)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

/// Final path component, accepting both `/` and `\` separators.
pub fn basename(token: &str) -> &str {
    token.rsplit(['/', '\\']).next().unwrap_or(token)
}
