//! CLI argument definitions for the campaign runner.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "harmonia",
    version,
    about = "Harmonize multimode survey data into one table per information level",
    long_about = "Harmonize the answers of a survey collected through several modes.\n\n\
                  Each mode is prefixed and derived on its own, then all modes are\n\
                  reconciled into one dataset and split per questionnaire group."
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
    /// Run every stage and write the output tables.
    Run(RunArgs),

    /// Load metadata and answers of every mode, then save the bindings.
    BuildBindings(StageArgs),

    /// Run the per-mode steps on saved bindings.
    Unimodal(StageArgs),

    /// Reconcile modes and split information levels on saved bindings.
    Multimodal(StageArgs),

    /// Write the output tables from saved bindings.
    Output(OutputArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the campaign configuration file.
    #[arg(value_name = "CAMPAIGN_JSON")]
    pub campaign: PathBuf,

    /// Output directory (default: <CAMPAIGN_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Exit with status 1 when the run recorded any issue.
    #[arg(long = "fail-on-issues")]
    pub fail_on_issues: bool,

    /// Hide the stage progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Args)]
pub struct StageArgs {
    /// Path to the campaign configuration file.
    #[arg(value_name = "CAMPAIGN_JSON")]
    pub campaign: PathBuf,

    /// Directory holding the saved bindings (default: <CAMPAIGN_DIR>/state).
    #[arg(long = "state-dir", value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Exit with status 1 when the saved state holds any issue.
    #[arg(long = "fail-on-issues")]
    pub fail_on_issues: bool,
}

#[derive(Args)]
pub struct OutputArgs {
    #[command(flatten)]
    pub stage: StageArgs,

    /// Output directory (default: <CAMPAIGN_DIR>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
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
