use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, SettingsLayer};

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedArgs {
    Help,
    Version,
    Run {
        /// Optional TOML file providing defaults for unset flags.
        config: Option<PathBuf>,
        layer: SettingsLayer,
    },
}

/// Parse command-line arguments (without the program name).
///
/// Value flags accept both `--flag value` and `--flag=value`.
pub fn parse_args(args: Vec<String>) -> Result<ParsedArgs, ConfigError> {
    let mut layer = SettingsLayer::default();
    let mut config = None;
    let mut positionals = Vec::new();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if arg.starts_with("--") => {
                (flag.to_string(), Some(value.to_string()))
            }
            _ => (arg.clone(), None),
        };
        match flag.as_str() {
            "-h" | "--help" => return Ok(ParsedArgs::Help),
            "-v" | "--version" => return Ok(ParsedArgs::Version),
            "-s" | "--service" => set_switch(&mut layer.service, &inline, &arg)?,
            "-c" | "--conf-mat" => set_switch(&mut layer.conf_mat, &inline, &arg)?,
            "-a" | "--all-labels" => set_switch(&mut layer.all_labels, &inline, &arg)?,
            "-e" | "--err-log" => set_switch(&mut layer.err_log, &inline, &arg)?,
            "--nrop" => set_switch(&mut layer.nrop, &inline, &arg)?,
            "--gt" => layer.gt = Some(take_value(&flag, inline, &mut iter)?.into()),
            "--label" => layer.label = Some(take_value(&flag, inline, &mut iter)?.into()),
            "--config" => config = Some(PathBuf::from(take_value(&flag, inline, &mut iter)?)),
            "--pos" => layer.pos = Some(parse_value(&flag, take_value(&flag, inline, &mut iter)?)?),
            "--label-range" => {
                layer.label_range = Some(parse_value(&flag, take_value(&flag, inline, &mut iter)?)?)
            }
            "--top-k" => {
                layer.top_k = Some(parse_value(&flag, take_value(&flag, inline, &mut iter)?)?)
            }
            "--log-lv" => {
                layer.log_lv = Some(parse_value(&flag, take_value(&flag, inline, &mut iter)?)?)
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(ConfigError::UnknownArgument(arg));
            }
            _ => positionals.push(arg),
        }
    }

    let mut positionals = positionals.into_iter();
    layer.in_log = positionals.next().map(PathBuf::from);
    layer.out_path = positionals.next().map(PathBuf::from);
    if let Some(extra) = positionals.next() {
        return Err(ConfigError::UnexpectedArgument(extra));
    }
    Ok(ParsedArgs::Run { config, layer })
}

fn set_switch(
    slot: &mut Option<bool>,
    inline: &Option<String>,
    arg: &str,
) -> Result<(), ConfigError> {
    if inline.is_some() {
        return Err(ConfigError::UnknownArgument(arg.to_string()));
    }
    *slot = Some(true);
    Ok(())
}

fn take_value(
    flag: &str,
    inline: Option<String>,
    iter: &mut impl Iterator<Item = String>,
) -> Result<String, ConfigError> {
    inline
        .or_else(|| iter.next())
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse_value<T>(flag: &str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|err| ConfigError::InvalidValue {
        flag: flag.to_string(),
        reason: err.to_string(),
        value,
    })
}

/// Usage text printed for `--help`.
pub fn help_text() -> String {
    [
        "clseval - image classification evaluator",
        "",
        "Usage:",
        "  clseval <in-log> <out-path> --gt <file> [options]",
        "  clseval -v | --version",
        "  clseval -h | --help",
        "",
        "Arguments:",
        "  <in-log>                 JSON inference log.",
        "  <out-path>               Output directory (created if missing).",
        "",
        "Options:",
        "  --gt <file>              Ground-truth list `<image> <label>` (required).",
        "  --pos <int>              Positive label index (default: 1).",
        "  -a, --all-labels         Evaluate every label in 0..label-range.",
        "  --label-range <int>      Number of labels (required with --all-labels).",
        "  -c, --conf-mat           Also build the confusion matrix.",
        "  --label <file>           Index-to-label file for confusion matrix axes.",
        "  --top-k <int>            Top-k index field used by the confusion matrix (default: 1).",
        "  -e, --err-log            Save misclassified images as <out-path>/<label>/err_img.json.",
        "  -s, --service            Input is an online-service log.",
        "  --nrop                   Service log uses the nrop schema.",
        "  --log-lv <level>         DEBUG, INFO, WARNING, ERROR or CRITICAL (default: INFO).",
        "  --config <file>          TOML file with defaults for any option above.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn layer_of(parsed: ParsedArgs) -> SettingsLayer {
        match parsed {
            ParsedArgs::Run { layer, .. } => layer,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn parses_positionals_and_values() {
        let layer = layer_of(
            parse_args(args(&[
                "log.json", "out", "--gt", "val.txt", "--pos=2", "-a", "--label-range", "4",
                "--log-lv", "debug",
            ]))
            .unwrap(),
        );
        assert_eq!(layer.in_log, Some(PathBuf::from("log.json")));
        assert_eq!(layer.out_path, Some(PathBuf::from("out")));
        assert_eq!(layer.gt, Some(PathBuf::from("val.txt")));
        assert_eq!(layer.pos, Some(2));
        assert_eq!(layer.all_labels, Some(true));
        assert_eq!(layer.label_range, Some(4));
        assert_eq!(layer.log_lv, Some(LogLevel::Debug));
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(parse_args(args(&["-h", "--bogus"])).unwrap(), ParsedArgs::Help);
        assert_eq!(parse_args(args(&["--version"])).unwrap(), ParsedArgs::Version);
    }

    #[test]
    fn rejects_unknown_and_malformed_flags() {
        assert!(matches!(
            parse_args(args(&["--bogus"])),
            Err(ConfigError::UnknownArgument(_))
        ));
        assert!(matches!(
            parse_args(args(&["--pos", "x"])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            parse_args(args(&["--gt"])),
            Err(ConfigError::MissingValue(_))
        ));
        assert!(matches!(
            parse_args(args(&["a", "b", "c"])),
            Err(ConfigError::UnexpectedArgument(_))
        ));
        assert!(matches!(
            parse_args(args(&["--service=yes"])),
            Err(ConfigError::UnknownArgument(_))
        ));
    }
}
