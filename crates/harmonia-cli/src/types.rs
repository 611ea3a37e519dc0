use std::path::PathBuf;

use harmonia_output::OutputSummary;
use harmonia_transform::{Issue, PipelineContext, StageReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSummary {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub identifiers: Vec<String>,
}

#[derive(Debug)]
pub struct RunResult {
    pub campaign: String,
    pub stages: Vec<StageReport>,
    pub bindings: Vec<BindingSummary>,
    pub output: Option<OutputSummary>,
    pub state_dir: Option<PathBuf>,
    pub issues: Vec<Issue>,
}

impl RunResult {
    pub fn new(campaign: impl Into<String>, context: &PipelineContext) -> Self {
        let bindings = context
            .bindings
            .iter()
            .map(|(name, dataset)| BindingSummary {
                name: name.clone(),
                rows: dataset.height(),
                columns: dataset.width(),
                identifiers: dataset.identifier_names(),
            })
            .collect();
        Self {
            campaign: campaign.into(),
            stages: Vec::new(),
            bindings,
            output: None,
            state_dir: None,
            issues: context.issues.clone(),
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}
