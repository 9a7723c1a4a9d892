use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::logging::LogLevel;

use super::ConfigError;

/// One source of settings (command line or TOML file). Unset fields defer to
/// lower-priority layers and finally to defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsLayer {
    pub in_log: Option<PathBuf>,
    pub out_path: Option<PathBuf>,
    pub gt: Option<PathBuf>,
    pub pos: Option<usize>,
    pub label_range: Option<usize>,
    pub label: Option<PathBuf>,
    pub top_k: Option<usize>,
    pub log_lv: Option<LogLevel>,
    pub err_log: Option<bool>,
    pub conf_mat: Option<bool>,
    pub all_labels: Option<bool>,
    pub service: Option<bool>,
    pub nrop: Option<bool>,
}

impl SettingsLayer {
    /// Read a TOML settings file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Fields set in `top` win over fields set in `self`.
    pub fn overlay(self, top: SettingsLayer) -> SettingsLayer {
        SettingsLayer {
            in_log: top.in_log.or(self.in_log),
            out_path: top.out_path.or(self.out_path),
            gt: top.gt.or(self.gt),
            pos: top.pos.or(self.pos),
            label_range: top.label_range.or(self.label_range),
            label: top.label.or(self.label),
            top_k: top.top_k.or(self.top_k),
            log_lv: top.log_lv.or(self.log_lv),
            err_log: top.err_log.or(self.err_log),
            conf_mat: top.conf_mat.or(self.conf_mat),
            all_labels: top.all_labels.or(self.all_labels),
            service: top.service.or(self.service),
            nrop: top.nrop.or(self.nrop),
        }
    }
}
