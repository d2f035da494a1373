//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "fitpanel",
    version,
    about = "Clean fitness-tracker CSV exports and compute panel analyses",
    long_about = "Clean raw fitness-tracker CSV exports and compute panel analyses.\n\n\
                  Cleaned tables are written to <OUT>/cleaned with a SHA-256 manifest,\n\
                  result tables to <OUT>/analysis, and row accounting to <OUT>/run_report.json."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean a raw export directory and compute every result table.
    Run(PipelineArgs),

    /// Clean a raw export directory without computing result tables.
    Clean(PipelineArgs),

    /// Compute result tables from a previously cleaned directory.
    Analyze(AnalyzeArgs),

    /// List the datasets the pipeline recognizes.
    Datasets,
}

#[derive(Args)]
pub struct PipelineArgs {
    /// Directory containing the raw CSV exports.
    #[arg(value_name = "RAW_DIR")]
    pub raw_dir: PathBuf,

    /// Output directory (default: <RAW_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML file overriding thresholds, bounds and datetime patterns.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run every stage in memory and report without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Directory of cleaned tables written by `clean` or `run`.
    #[arg(value_name = "CLEANED_DIR")]
    pub cleaned_dir: PathBuf,

    /// Output directory; results go to <DIR>/analysis (default: parent of CLEANED_DIR).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML file overriding thresholds and goal definitions.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Compute and report without writing files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
