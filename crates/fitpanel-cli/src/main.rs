//! fitpanel command-line entry point.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use fitpanel_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_analyze, run_datasets, run_pipeline_command};
use crate::summary::{print_analysis_summary, print_pipeline_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match cli.command {
        Command::Run(args) => match run_pipeline_command(&args, true) {
            Ok(outcome) => {
                print_pipeline_summary(&outcome);
                0
            }
            Err(error) => fail(&error),
        },
        Command::Clean(args) => match run_pipeline_command(&args, false) {
            Ok(outcome) => {
                print_pipeline_summary(&outcome);
                0
            }
            Err(error) => fail(&error),
        },
        Command::Analyze(args) => match run_analyze(&args) {
            Ok(result) => {
                print_analysis_summary(&result);
                0
            }
            Err(error) => fail(&error),
        },
        Command::Datasets => match run_datasets() {
            Ok(()) => 0,
            Err(error) => fail(&error),
        },
    };
    std::process::exit(exit_code);
}

fn fail(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    1
}

/// Logging settings from global flags. An explicit `--log-level` beats `-v`/`-q`,
/// and either one disables `RUST_LOG`.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let level_filter = match cli.log_level {
        Some(LogLevelArg::Error) => LevelFilter::ERROR,
        Some(LogLevelArg::Warn) => LevelFilter::WARN,
        Some(LogLevelArg::Info) => LevelFilter::INFO,
        Some(LogLevelArg::Debug) => LevelFilter::DEBUG,
        Some(LogLevelArg::Trace) => LevelFilter::TRACE,
        None => cli.verbosity.tracing_level_filter(),
    };
    let format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    let with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    LogConfig {
        level_filter,
        use_env_filter: !(cli.verbosity.is_present() || cli.log_level.is_some()),
        with_ansi,
        format,
        log_file: cli.log_file.clone(),
        ..LogConfig::default()
    }
}
