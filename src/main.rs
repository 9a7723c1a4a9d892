//! Command-line entry point for the classification evaluator.

use clseval::config::{self, CliCommand};
use clseval::{logging, runner};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let command =
        config::command_from_args(std::env::args().skip(1).collect()).map_err(|err| {
            format!("{err}\n\n{}", config::help_text())
        })?;
    let settings = match command {
        CliCommand::Help => {
            println!("{}", config::help_text());
            return Ok(());
        }
        CliCommand::Version => {
            println!("clseval {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        CliCommand::Evaluate(settings) => settings,
    };

    // Dropped when `run` returns, before `main` may exit the process.
    let _log_guard = match logging::init(settings.log_level, Some(&settings.out_path)) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Logging disabled: {err}");
            None
        }
    };
    runner::run(&settings).map_err(|err| {
        tracing::error!("Evaluation failed: {err}");
        err.to_string()
    })
}
