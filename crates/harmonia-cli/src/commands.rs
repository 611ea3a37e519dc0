use std::io::{self, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result};
use harmonia_cli::pipeline::{
    StageKind, default_output_dir, default_state_dir, run_campaign, run_stage,
};
use harmonia_cli::types::RunResult;
use harmonia_ingest::{CampaignConfig, load_campaign};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::{RunArgs, StageArgs};

fn load_config(path: &Path) -> Result<CampaignConfig> {
    load_campaign(path).with_context(|| format!("load campaign {}", path.display()))
}

pub fn run(args: &RunArgs, show_progress: bool) -> Result<RunResult> {
    let config = load_config(&args.campaign)?;
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.campaign));
    let progress = stage_progress(show_progress && !args.no_progress);
    let result = run_campaign(&config, &output_dir, |stage| {
        progress.set_message(stage.label());
        progress.inc(1);
    });
    progress.finish_and_clear();
    result
}

pub fn run_step(stage: StageKind, args: &StageArgs, output_dir: Option<&Path>) -> Result<RunResult> {
    let config = load_config(&args.campaign)?;
    let state_dir = args
        .state_dir
        .clone()
        .unwrap_or_else(|| default_state_dir(&args.campaign));
    let output_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_dir(&args.campaign));
    run_stage(stage, &config, &state_dir, &output_dir)
}

fn stage_progress(visible: bool) -> ProgressBar {
    if !visible || !io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(StageKind::ALL.len() as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    bar.set_style(style);
    bar
}
