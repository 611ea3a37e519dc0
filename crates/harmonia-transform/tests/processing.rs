//! Two-phase step execution and stage orchestration.

use std::cell::RefCell;
use std::fs;

use harmonia_model::constants::ROOT_GROUP_NAME;
use harmonia_model::{CalculatedVariables, Group, MetadataModel, Variable, VariableType};
use harmonia_transform::steps::GroupPrefixStep;
use harmonia_transform::{
    Bindings, DataFormat, Dataset, ExecutionEngine, InstructionGenerator, Issue, ModeSpec,
    PipelineContext, Result, Statement, TransformError, apply_step,
};
use polars::prelude::*;
use tempfile::TempDir;

/// Records rendered statements instead of evaluating them.
#[derive(Default)]
struct RecordingEngine {
    executed: RefCell<Vec<String>>,
}

impl ExecutionEngine for RecordingEngine {
    fn execute(
        &self,
        statements: &[Statement],
        _bindings: &mut Bindings,
        _issues: &mut Vec<Issue>,
    ) -> Result<()> {
        self.executed
            .borrow_mut()
            .extend(statements.iter().map(ToString::to_string));
        Ok(())
    }
}

fn grouped_model() -> MetadataModel {
    let mut model = MetadataModel::new();
    model.put_group(Group::new("G1", ROOT_GROUP_NAME));
    model.put_variable(Variable::new("PRENOM", "G1", VariableType::String));
    model
}

fn bindings_with(name: &str) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.insert(
        name,
        Dataset::new(df!("IdUE" => ["1"], "PRENOM" => ["Ana"]).unwrap(), ["IdUE"]),
    );
    bindings
}

#[test]
fn user_script_runs_after_generated_statements() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("capi.vtl");
    fs::write(&script, "CAPI := CAPI [drop G1.PRENOM];\n").unwrap();

    let model = grouped_model();
    let engine = RecordingEngine::default();
    let mut bindings = bindings_with("CAPI");
    let mut issues = Vec::new();
    let report = apply_step(
        &mut GroupPrefixStep::new(&model),
        "CAPI",
        Some(script.as_path()),
        &mut bindings,
        &engine,
        &mut issues,
    )
    .unwrap();

    assert_eq!(
        engine.executed.borrow().as_slice(),
        [
            "CAPI := CAPI [rename PRENOM to G1.PRENOM];",
            "CAPI := CAPI [drop G1.PRENOM];",
        ]
    );
    assert_eq!(report.automated, 1);
    assert_eq!(report.user, 1);
    assert_eq!(report.issues, 0);
    assert!(issues.is_empty());
}

#[test]
fn unreadable_user_script_is_a_recoverable_issue() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.vtl");

    let model = grouped_model();
    let engine = RecordingEngine::default();
    let mut bindings = bindings_with("CAPI");
    let mut issues = Vec::new();
    let report = apply_step(
        &mut GroupPrefixStep::new(&model),
        "CAPI",
        Some(missing.as_path()),
        &mut bindings,
        &engine,
        &mut issues,
    )
    .unwrap();

    assert_eq!(engine.executed.borrow().len(), 1);
    assert_eq!(report.issues, 1);
    assert!(matches!(&issues[0], Issue::UserScript { path, .. } if *path == missing));
}

#[test]
fn blank_user_script_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("blank.vtl");
    fs::write(&script, "  \n").unwrap();

    let model = MetadataModel::new();
    let engine = RecordingEngine::default();
    let mut issues = Vec::new();
    let report = apply_step(
        &mut GroupPrefixStep::new(&model),
        "CAPI",
        Some(script.as_path()),
        &mut bindings_with("CAPI"),
        &engine,
        &mut issues,
    )
    .unwrap();

    assert!(engine.executed.borrow().is_empty());
    assert_eq!((report.automated, report.user, report.issues), (0, 0, 0));
}

#[test]
fn data_format_selects_the_unimodal_step() {
    let model = grouped_model();
    let calculated = CalculatedVariables::default();
    assert_eq!("paper".parse::<DataFormat>(), Ok(DataFormat::Paper));
    assert_eq!("LUNATIC_XML".parse::<DataFormat>(), Ok(DataFormat::Lunatic));
    assert!("fax".parse::<DataFormat>().is_err());
    assert_eq!(
        DataFormat::Paper
            .unimodal_step(&model, &calculated)
            .step_name(),
        "paper single-choice recoding"
    );
    assert_eq!(
        DataFormat::Lunatic
            .unimodal_step(&model, &calculated)
            .step_name(),
        "calculated variables"
    );
    let statements = DataFormat::Xforms
        .unimodal_step(&model, &calculated)
        .generate("XF", &mut Bindings::new())
        .unwrap();
    assert!(statements.is_empty());
}

#[test]
fn unimodal_stage_runs_prefixes_then_format_step_per_mode() {
    let mut context = PipelineContext::new();
    context
        .register_metadata("CAPI", grouped_model(), CalculatedVariables::default())
        .unwrap();
    context.bindings = bindings_with("CAPI");

    let engine = RecordingEngine::default();
    let report = context
        .run_unimodal(&[ModeSpec::new("CAPI", DataFormat::Lunatic)], &engine)
        .unwrap();
    let steps: Vec<&str> = report.steps.iter().map(|s| s.step.as_str()).collect();
    assert_eq!(steps, ["group prefixes", "calculated variables"]);
    assert_eq!(report.issue_count(), 0);
}

#[test]
fn unimodal_stage_rejects_unknown_modes() {
    let mut context = PipelineContext::new();
    context.bindings = bindings_with("CAPI");
    let result = context.run_unimodal(
        &[ModeSpec::new("CAPI", DataFormat::Lunatic)],
        &RecordingEngine::default(),
    );
    assert!(matches!(result, Err(TransformError::UnknownMode(mode)) if mode == "CAPI"));
}

#[test]
fn invalid_metadata_is_rejected_at_registration() {
    let mut model = MetadataModel::new();
    model.put_group(Group::new("LOOP", "MISSING"));
    let mut context = PipelineContext::new();
    let result = context.register_metadata("CAPI", model, CalculatedVariables::default());
    assert!(matches!(result, Err(TransformError::Model(_))));
}
