//! Multimode survey campaign runner.

use clap::{ColorChoice, Parser};
use harmonia_cli::logging::{LogConfig, LogFormat, init_logging};
use harmonia_cli::pipeline::StageKind;
use std::io::{self, IsTerminal};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run, run_step};
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let show_progress = log_config.log_file.is_some() || log_config.format != LogFormat::Json;
    let (outcome, fail_on_issues) = match &cli.command {
        Command::Run(args) => (run(args, show_progress), args.fail_on_issues),
        Command::BuildBindings(args) => (
            run_step(StageKind::BuildBindings, args, None),
            args.fail_on_issues,
        ),
        Command::Unimodal(args) => (
            run_step(StageKind::Unimodal, args, None),
            args.fail_on_issues,
        ),
        Command::Multimodal(args) => (
            run_step(StageKind::Multimodal, args, None),
            args.fail_on_issues,
        ),
        Command::Output(args) => (
            run_step(StageKind::Output, &args.stage, args.output_dir.as_deref()),
            args.stage.fail_on_issues,
        ),
    };
    let exit_code = match outcome {
        Ok(result) => {
            print_summary(&result);
            if fail_on_issues && result.has_issues() { 1 } else { 0 }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
