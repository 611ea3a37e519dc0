//! Two-phase step execution and per-format unimodal step selection.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use harmonia_model::{CalculatedVariables, MetadataModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::bindings::Bindings;
use crate::engine::ExecutionEngine;
use crate::error::Result;
use crate::issue::Issue;
use crate::statement::{Statement, parse_script};
use crate::steps::{CalculatedStep, InstructionGenerator, PaperUcqStep, TransformationsStep};

/// Outcome of one step on one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub step: String,
    pub binding: String,
    /// Generated statements executed in the automated phase.
    pub automated: usize,
    /// Statements read from the user script.
    pub user: usize,
    /// Issues recorded while running the step.
    pub issues: usize,
}

/// Runs a step: generated statements first, then the user script if any.
///
/// An unreadable user script is recorded as an issue and skipped.
pub fn apply_step(
    generator: &mut dyn InstructionGenerator,
    binding_name: &str,
    user_script: Option<&Path>,
    bindings: &mut Bindings,
    engine: &dyn ExecutionEngine,
    issues: &mut Vec<Issue>,
) -> Result<StepReport> {
    let step = generator.step_name().to_string();
    let span = info_span!("step", step = %step, binding = %binding_name);
    let _guard = span.enter();
    let issues_before = issues.len();

    let automated = generator.generate(binding_name, bindings)?;
    for statement in &automated {
        debug!(%statement, "generated");
    }
    if !automated.is_empty() {
        engine.execute(&automated, bindings, issues)?;
    }

    let user = match user_script {
        Some(path) => read_user_script(path, issues),
        None => {
            debug!("no user script");
            Vec::new()
        }
    };
    if !user.is_empty() {
        info!(statements = user.len(), "executing user script");
        engine.execute(&user, bindings, issues)?;
    }

    let report = StepReport {
        step,
        binding: binding_name.to_string(),
        automated: automated.len(),
        user: user.len(),
        issues: issues.len() - issues_before,
    };
    info!(
        automated = report.automated,
        user = report.user,
        issues = report.issues,
        "step complete"
    );
    Ok(report)
}

fn read_user_script(path: &Path, issues: &mut Vec<Issue>) -> Vec<Statement> {
    match fs::read_to_string(path) {
        Ok(text) if text.trim().is_empty() => {
            info!(path = %path.display(), "user script is blank");
            Vec::new()
        }
        Ok(text) => parse_script(&text),
        Err(error) => {
            warn!(path = %path.display(), %error, "user script unreadable");
            issues.push(Issue::UserScript {
                path: path.to_path_buf(),
                message: error.to_string(),
            });
            Vec::new()
        }
    }
}

/// How a mode's data was collected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataFormat {
    #[default]
    Lunatic,
    Paper,
    Xforms,
}

impl DataFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Lunatic => "LUNATIC",
            DataFormat::Paper => "PAPER",
            DataFormat::Xforms => "XFORMS",
        }
    }

    /// Format-specific unimodal step.
    pub fn unimodal_step<'a>(
        self,
        metadata: &'a MetadataModel,
        calculated: &'a CalculatedVariables,
    ) -> UnimodalStep<'a> {
        match self {
            DataFormat::Lunatic => UnimodalStep::Calculated(CalculatedStep::new(metadata, calculated)),
            DataFormat::Paper => UnimodalStep::PaperUcq(PaperUcqStep::new(metadata)),
            DataFormat::Xforms => UnimodalStep::UserOnly(TransformationsStep),
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LUNATIC" | "LUNATIC_JSON" | "LUNATIC_XML" => Ok(DataFormat::Lunatic),
            "PAPER" => Ok(DataFormat::Paper),
            "XFORMS" => Ok(DataFormat::Xforms),
            other => Err(format!("unknown data format: {other}")),
        }
    }
}

/// The unimodal step chosen for a data format.
pub enum UnimodalStep<'a> {
    Calculated(CalculatedStep<'a>),
    PaperUcq(PaperUcqStep<'a>),
    UserOnly(TransformationsStep),
}

impl UnimodalStep<'_> {
    fn inner(&mut self) -> &mut dyn InstructionGenerator {
        match self {
            UnimodalStep::Calculated(step) => step,
            UnimodalStep::PaperUcq(step) => step,
            UnimodalStep::UserOnly(step) => step,
        }
    }
}

impl InstructionGenerator for UnimodalStep<'_> {
    fn step_name(&self) -> &str {
        match self {
            UnimodalStep::Calculated(step) => step.step_name(),
            UnimodalStep::PaperUcq(step) => step.step_name(),
            UnimodalStep::UserOnly(_) => "unimodal user script",
        }
    }

    fn generate(&mut self, binding_name: &str, bindings: &mut Bindings) -> Result<Vec<Statement>> {
        self.inner().generate(binding_name, bindings)
    }
}
