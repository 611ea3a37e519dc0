//! Stage runners shared by the full run and the step-by-step commands.
//!
//! A full run keeps the pipeline context in memory. Step-by-step commands
//! restore the context from a state directory, run one stage, and save it
//! back for the next command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use harmonia_engine::PolarsEngine;
use harmonia_ingest::{CampaignConfig, build_bindings};
use harmonia_output::{OutputSummary, load_state, save_state, write_outputs};
use harmonia_transform::{PipelineContext, StageReport};
use tracing::{info, info_span};

use crate::types::RunResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    BuildBindings,
    Unimodal,
    Multimodal,
    Output,
}

impl StageKind {
    pub const ALL: [StageKind; 4] = [
        StageKind::BuildBindings,
        StageKind::Unimodal,
        StageKind::Multimodal,
        StageKind::Output,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StageKind::BuildBindings => "build bindings",
            StageKind::Unimodal => "unimodal",
            StageKind::Multimodal => "multimodal",
            StageKind::Output => "output",
        }
    }
}

fn campaign_dir(campaign_file: &Path) -> &Path {
    campaign_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// `<campaign dir>/output`
pub fn default_output_dir(campaign_file: &Path) -> PathBuf {
    campaign_dir(campaign_file).join("output")
}

/// `<campaign dir>/state`
pub fn default_state_dir(campaign_file: &Path) -> PathBuf {
    campaign_dir(campaign_file).join("state")
}

fn unimodal(context: &mut PipelineContext, config: &CampaignConfig) -> Result<StageReport> {
    let engine = PolarsEngine::new();
    context
        .run_unimodal(&config.mode_specs(), &engine)
        .context("unimodal stage")
}

fn multimodal(context: &mut PipelineContext, config: &CampaignConfig) -> Result<StageReport> {
    let engine = PolarsEngine::new();
    context
        .run_multimodal(
            &config.mode_specs(),
            &config.multimodal_scripts(),
            &engine,
        )
        .context("multimodal stage")
}

fn output(
    context: &mut PipelineContext,
    config: &CampaignConfig,
    output_dir: &Path,
) -> Result<OutputSummary> {
    write_outputs(context, &config.campaign, output_dir)
        .with_context(|| format!("write outputs to {}", output_dir.display()))
}

/// Runs every stage in memory. `on_stage` is called after each stage.
pub fn run_campaign(
    config: &CampaignConfig,
    output_dir: &Path,
    mut on_stage: impl FnMut(StageKind),
) -> Result<RunResult> {
    let span = info_span!("campaign", campaign = %config.campaign);
    let _guard = span.enter();

    let mut context = build_bindings(config).context("build bindings")?;
    on_stage(StageKind::BuildBindings);
    let unimodal_report = unimodal(&mut context, config)?;
    on_stage(StageKind::Unimodal);
    let multimodal_report = multimodal(&mut context, config)?;
    on_stage(StageKind::Multimodal);
    let summary = output(&mut context, config, output_dir)?;
    on_stage(StageKind::Output);

    let mut result = RunResult::new(&config.campaign, &context);
    result.stages = vec![unimodal_report, multimodal_report];
    result.output = Some(summary);
    info!(issues = result.issues.len(), "campaign processed");
    Ok(result)
}

fn load_context(state_dir: &Path) -> Result<PipelineContext> {
    let parts = load_state(state_dir)
        .with_context(|| format!("load state from {}", state_dir.display()))?;
    Ok(PipelineContext::from_parts(parts))
}

/// Runs one stage against the state saved in `state_dir`.
///
/// `output_dir` is only read by [`StageKind::Output`].
pub fn run_stage(
    stage: StageKind,
    config: &CampaignConfig,
    state_dir: &Path,
    output_dir: &Path,
) -> Result<RunResult> {
    let span = info_span!("stage", campaign = %config.campaign, stage = stage.label());
    let _guard = span.enter();

    let mut stages = Vec::new();
    let mut summary = None;
    let context = match stage {
        StageKind::BuildBindings => build_bindings(config).context("build bindings")?,
        StageKind::Unimodal => {
            let mut context = load_context(state_dir)?;
            stages.push(unimodal(&mut context, config)?);
            context
        }
        StageKind::Multimodal => {
            let mut context = load_context(state_dir)?;
            stages.push(multimodal(&mut context, config)?);
            context
        }
        StageKind::Output => {
            let mut context = load_context(state_dir)?;
            summary = Some(output(&mut context, config, output_dir)?);
            context
        }
    };

    let mut result = RunResult::new(&config.campaign, &context);
    result.stages = stages;
    result.output = summary;
    result.state_dir = Some(state_dir.to_path_buf());
    save_state(state_dir, &context.into_parts())
        .with_context(|| format!("save state to {}", state_dir.display()))?;
    Ok(result)
}
