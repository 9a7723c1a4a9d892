//! Label-index file loader (`<index> <label-name>` per line).

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabelNamesError {
    #[error("Failed to read label file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed label record at line {line}: `{text}`")]
    Malformed { line: usize, text: String },
}

/// Human-readable class names in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelNames {
    names: Vec<String>,
}

impl LabelNames {
    pub fn load(path: &Path) -> Result<Self, LabelNamesError> {
        let text = std::fs::read_to_string(path).map_err(|source| LabelNamesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, LabelNamesError> {
        let mut names = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let name = raw
                .split_whitespace()
                .nth(1)
                .ok_or_else(|| LabelNamesError::Malformed {
                    line: idx + 1,
                    text: raw.trim().to_string(),
                })?;
            names.push(name.to_string());
        }
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name for `index`, falling back to the index itself.
    pub fn name(&self, index: usize) -> String {
        self.names
            .get(index)
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }
}
