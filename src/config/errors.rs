use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling run settings. All of them are fatal and
/// surface before any evaluation work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option or positional argument was not provided.
    #[error("{0} is required")]
    Missing(&'static str),
    /// A flag that takes a value was given none.
    #[error("{0} requires a value")]
    MissingValue(String),
    /// A value could not be parsed.
    #[error("Invalid {flag} value `{value}`: {reason}")]
    InvalidValue {
        flag: String,
        value: String,
        reason: String,
    },
    /// The flag is not recognised.
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
    /// More than two positional arguments.
    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
    /// All-labels mode needs to know how many labels to iterate.
    #[error("--label-range is required in all-labels mode")]
    MissingLabelRange,
    /// Confusion matrix needs a label count from `--label` or `--label-range`.
    #[error("--conf-mat requires --label or --label-range")]
    MissingLabelCount,
    /// Failed to read a config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
}
