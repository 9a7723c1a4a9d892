//! Library exports for the `clseval` binary, benchmarks and tests.
/// Run settings from the command line and TOML files.
pub mod config;
/// Ground truth, inference logs and label names.
pub mod dataset;
/// Tracing setup shared by binaries.
pub mod logging;
/// Threshold sweep, average precision, accuracy and confusion matrix.
pub mod metrics;
/// Report sinks and output formatting.
pub mod report;
/// Orchestration of a full evaluation run.
pub mod runner;
