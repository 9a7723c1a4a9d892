//! Run settings assembled from the command line and an optional TOML file.

mod args;
mod errors;
mod layer;

use std::path::PathBuf;

use crate::dataset::ServiceFlavor;
use crate::logging::LogLevel;

pub use args::{ParsedArgs, help_text, parse_args};
pub use errors::ConfigError;
pub use layer::SettingsLayer;

/// Positive label used when `--pos` is not given.
pub const DEFAULT_POSITIVE_LABEL: usize = 1;
pub const DEFAULT_TOP_K: usize = 1;

/// Which evaluation the run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Full evaluation for one positive label.
    SingleLabel { positive_label: usize },
    /// Full evaluation repeated for every label in `0..label_range`.
    AllLabels { label_range: usize },
    /// Hard-decision metrics on a converted online-service log.
    Service {
        positive_label: usize,
        flavor: ServiceFlavor,
    },
}

/// Validated settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalSettings {
    pub in_log: PathBuf,
    pub out_path: PathBuf,
    pub ground_truth: PathBuf,
    pub mode: RunMode,
    pub label_range: Option<usize>,
    pub label_file: Option<PathBuf>,
    pub top_k: usize,
    pub log_level: LogLevel,
    pub err_log: bool,
    pub conf_mat: bool,
}

/// Outcome of interpreting the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Help,
    Version,
    Evaluate(EvalSettings),
}

/// Parse arguments, merge the optional `--config` file beneath them, validate.
pub fn command_from_args(args: Vec<String>) -> Result<CliCommand, ConfigError> {
    match parse_args(args)? {
        ParsedArgs::Help => Ok(CliCommand::Help),
        ParsedArgs::Version => Ok(CliCommand::Version),
        ParsedArgs::Run { config, layer } => {
            let merged = match config {
                Some(path) => SettingsLayer::load(&path)?.overlay(layer),
                None => layer,
            };
            EvalSettings::resolve(merged).map(CliCommand::Evaluate)
        }
    }
}

impl EvalSettings {
    /// Apply defaults and check the combinations that cannot run.
    pub fn resolve(layer: SettingsLayer) -> Result<Self, ConfigError> {
        let in_log = layer.in_log.ok_or(ConfigError::Missing("<in-log>"))?;
        let out_path = layer.out_path.ok_or(ConfigError::Missing("<out-path>"))?;
        let ground_truth = layer.gt.ok_or(ConfigError::Missing("--gt"))?;

        let top_k = layer.top_k.unwrap_or(DEFAULT_TOP_K);
        if top_k == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "--top-k".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if layer.label_range == Some(0) {
            return Err(ConfigError::InvalidValue {
                flag: "--label-range".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let positive_label = layer.pos.unwrap_or(DEFAULT_POSITIVE_LABEL);
        let mode = if layer.service.unwrap_or(false) {
            let flavor = if layer.nrop.unwrap_or(false) {
                ServiceFlavor::Nrop
            } else {
                ServiceFlavor::Pulp
            };
            RunMode::Service {
                positive_label,
                flavor,
            }
        } else if layer.all_labels.unwrap_or(false) {
            let label_range = layer.label_range.ok_or(ConfigError::MissingLabelRange)?;
            RunMode::AllLabels { label_range }
        } else {
            RunMode::SingleLabel { positive_label }
        };

        let conf_mat = layer.conf_mat.unwrap_or(false);
        if conf_mat && layer.label.is_none() && layer.label_range.is_none() {
            return Err(ConfigError::MissingLabelCount);
        }

        Ok(Self {
            in_log,
            out_path,
            ground_truth,
            mode,
            label_range: layer.label_range,
            label_file: layer.label,
            top_k,
            log_level: layer.log_lv.unwrap_or_default(),
            err_log: layer.err_log.unwrap_or(false),
            conf_mat,
        })
    }

    /// Settings as `name = value` pairs in name order, for the run banner.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let optional = |value: &Option<PathBuf>| {
            value
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "None".to_string())
        };
        let (mode, positive) = match self.mode {
            RunMode::SingleLabel { positive_label } => ("single-label", positive_label.to_string()),
            RunMode::AllLabels { .. } => ("all-labels", "-".to_string()),
            RunMode::Service {
                positive_label,
                flavor,
            } => (
                match flavor {
                    ServiceFlavor::Pulp => "service (pulp)",
                    ServiceFlavor::Nrop => "service (nrop)",
                },
                positive_label.to_string(),
            ),
        };
        vec![
            ("conf-mat", self.conf_mat.to_string()),
            ("err-log", self.err_log.to_string()),
            ("gt", self.ground_truth.display().to_string()),
            ("in-log", self.in_log.display().to_string()),
            ("label", optional(&self.label_file)),
            (
                "label-range",
                self.label_range
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "None".to_string()),
            ),
            ("log-lv", self.log_level.to_string()),
            ("mode", mode.to_string()),
            ("out-path", self.out_path.display().to_string()),
            ("pos", positive),
            ("top-k", self.top_k.to_string()),
        ]
    }
}
