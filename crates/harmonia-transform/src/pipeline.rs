//! Campaign-level orchestration of the unimodal and multimodal stages.

use std::collections::BTreeMap;
use std::path::PathBuf;

use harmonia_model::constants::MULTIMODE_DATASET_NAME;
use harmonia_model::{CalculatedVariables, MetadataModel};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::bindings::{Bindings, Dataset};
use crate::engine::ExecutionEngine;
use crate::error::{Result, TransformError};
use crate::issue::Issue;
use crate::processing::{DataFormat, StepReport, apply_step};
use crate::steps::{
    CleanUpStep, GroupPrefixStep, InformationLevelsStep, ReconciliationStep, TransformationsStep,
};

/// Supplies metadata for a collection mode.
pub trait MetadataSource {
    fn metadata(&self, mode: &str) -> Result<MetadataModel>;

    fn calculated_variables(&self, _mode: &str) -> Result<CalculatedVariables> {
        Ok(CalculatedVariables::default())
    }
}

/// A collection mode of the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSpec {
    pub name: String,
    #[serde(default)]
    pub data_format: DataFormat,
    /// User script run after the format-specific unimodal step.
    #[serde(default)]
    pub script: Option<PathBuf>,
}

impl ModeSpec {
    pub fn new(name: impl Into<String>, data_format: DataFormat) -> Self {
        Self {
            name: name.into(),
            data_format,
            script: None,
        }
    }

    pub fn with_script(mut self, script: impl Into<PathBuf>) -> Self {
        self.script = Some(script.into());
        self
    }
}

/// User scripts of the multimodal steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultimodalScripts {
    #[serde(default)]
    pub reconciliation: Option<PathBuf>,
    #[serde(default)]
    pub transformation: Option<PathBuf>,
    #[serde(default)]
    pub information_levels: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Unimodal,
    Multimodal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub steps: Vec<StepReport>,
}

impl StageReport {
    pub fn issue_count(&self) -> usize {
        self.steps.iter().map(|step| step.issues).sum()
    }
}

/// State carried through a run: bindings, per-mode metadata, issues.
#[derive(Debug, Default)]
pub struct PipelineContext {
    pub bindings: Bindings,
    pub issues: Vec<Issue>,
    metadata: BTreeMap<String, MetadataModel>,
    calculated: BTreeMap<String, CalculatedVariables>,
}

impl PipelineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the metadata of a mode after checking its group tree.
    pub fn register_metadata(
        &mut self,
        mode: impl Into<String>,
        metadata: MetadataModel,
        calculated: CalculatedVariables,
    ) -> Result<()> {
        metadata.validate()?;
        let mode = mode.into();
        self.calculated.insert(mode.clone(), calculated);
        self.metadata.insert(mode, metadata);
        Ok(())
    }

    /// Loads and registers the metadata of every mode from `source`.
    pub fn load_metadata(&mut self, modes: &[ModeSpec], source: &dyn MetadataSource) -> Result<()> {
        for mode in modes {
            let metadata = source.metadata(&mode.name)?;
            let calculated = source.calculated_variables(&mode.name)?;
            info!(
                mode = %mode.name,
                variables = metadata.variables().len(),
                calculated = calculated.len(),
                "metadata loaded"
            );
            self.register_metadata(mode.name.clone(), metadata, calculated)?;
        }
        Ok(())
    }

    pub fn bind(&mut self, name: impl Into<String>, dataset: Dataset) {
        self.bindings.insert(name, dataset);
    }

    pub fn metadata(&self, mode: &str) -> Option<&MetadataModel> {
        self.metadata.get(mode)
    }

    pub fn metadata_models(&self) -> &BTreeMap<String, MetadataModel> {
        &self.metadata
    }

    pub fn calculated_variables(&self, mode: &str) -> Option<&CalculatedVariables> {
        self.calculated.get(mode)
    }

    /// Union of every mode's metadata, first definition winning.
    pub fn merged_metadata(&self) -> MetadataModel {
        MetadataModel::merged(self.metadata.values())
    }

    /// Names of the information level datasets that are currently bound.
    pub fn information_level_names(&self) -> Result<Vec<String>> {
        let merged = self.merged_metadata();
        let mut names = vec![merged.root_group()?.name.clone()];
        names.extend(merged.sub_group_names());
        names.retain(|name| self.bindings.contains(name));
        Ok(names)
    }

    /// Group prefixes then the format-specific step, for every mode in turn.
    pub fn run_unimodal(
        &mut self,
        modes: &[ModeSpec],
        engine: &dyn ExecutionEngine,
    ) -> Result<StageReport> {
        let span = info_span!("unimodal", modes = modes.len());
        let _guard = span.enter();
        let empty = CalculatedVariables::default();
        let mut steps = Vec::new();

        for mode in modes {
            let metadata = self
                .metadata
                .get(&mode.name)
                .ok_or_else(|| TransformError::UnknownMode(mode.name.clone()))?;
            if !self.bindings.contains(&mode.name) {
                return Err(TransformError::MissingBinding(mode.name.clone()));
            }
            let calculated = self.calculated.get(&mode.name).unwrap_or(&empty);

            steps.push(apply_step(
                &mut GroupPrefixStep::new(metadata),
                &mode.name,
                None,
                &mut self.bindings,
                engine,
                &mut self.issues,
            )?);
            steps.push(apply_step(
                &mut mode.data_format.unimodal_step(metadata, calculated),
                &mode.name,
                mode.script.as_deref(),
                &mut self.bindings,
                engine,
                &mut self.issues,
            )?);
        }

        Ok(StageReport {
            stage: Stage::Unimodal,
            steps,
        })
    }

    /// Reconciliation, clean-up, transformations and information levels on
    /// the reconciled dataset.
    pub fn run_multimodal(
        &mut self,
        modes: &[ModeSpec],
        scripts: &MultimodalScripts,
        engine: &dyn ExecutionEngine,
    ) -> Result<StageReport> {
        let span = info_span!("multimodal", modes = modes.len());
        let _guard = span.enter();
        let names: Vec<String> = modes.iter().map(|mode| mode.name.clone()).collect();
        let binding = MULTIMODE_DATASET_NAME;
        let mut steps = Vec::new();

        steps.push(apply_step(
            &mut ReconciliationStep::new(names.iter().cloned()),
            binding,
            scripts.reconciliation.as_deref(),
            &mut self.bindings,
            engine,
            &mut self.issues,
        )?);
        steps.push(apply_step(
            &mut CleanUpStep::new(names, &mut self.metadata),
            binding,
            None,
            &mut self.bindings,
            engine,
            &mut self.issues,
        )?);
        steps.push(apply_step(
            &mut TransformationsStep,
            binding,
            scripts.transformation.as_deref(),
            &mut self.bindings,
            engine,
            &mut self.issues,
        )?);

        let merged = self.merged_metadata();
        steps.push(apply_step(
            &mut InformationLevelsStep::new(&merged),
            binding,
            scripts.information_levels.as_deref(),
            &mut self.bindings,
            engine,
            &mut self.issues,
        )?);

        Ok(StageReport {
            stage: Stage::Multimodal,
            steps,
        })
    }

    pub fn into_parts(self) -> PipelineParts {
        PipelineParts {
            bindings: self.bindings,
            metadata: self.metadata,
            calculated: self.calculated,
            issues: self.issues,
        }
    }

    /// Rebuilds a context from saved state.
    pub fn from_parts(parts: PipelineParts) -> Self {
        Self {
            bindings: parts.bindings,
            issues: parts.issues,
            metadata: parts.metadata,
            calculated: parts.calculated,
        }
    }
}

/// Owned contents of a [`PipelineContext`], for persistence between stages.
#[derive(Debug, Default)]
pub struct PipelineParts {
    pub bindings: Bindings,
    pub metadata: BTreeMap<String, MetadataModel>,
    pub calculated: BTreeMap<String, CalculatedVariables>,
    pub issues: Vec<Issue>,
}
