//! Full unimodal and multimodal stages on in-memory frames.

use harmonia_engine::{PolarsEngine, column_value_string};
use harmonia_model::constants::{MULTIMODE_DATASET_NAME, ROOT_GROUP_NAME};
use harmonia_model::{
    CalculatedVariable, CalculatedVariables, Group, MetadataModel, Variable, VariableKind,
    VariableType,
};
use harmonia_transform::steps::ReconciliationStep;
use harmonia_transform::{
    Bindings, DataFormat, Dataset, ExecutionEngine, InstructionGenerator, ModeSpec,
    MultimodalScripts, PipelineContext, Role,
};
use polars::prelude::*;

fn base_model() -> MetadataModel {
    let mut model = MetadataModel::new();
    model.put_group(Group::new("G1", ROOT_GROUP_NAME));
    model.put_variable(Variable::new("AGE", ROOT_GROUP_NAME, VariableType::Integer));
    model.put_variable(
        Variable::new("SEXE", ROOT_GROUP_NAME, VariableType::String)
            .with_kind(VariableKind::Ucq { modalities: vec![] }),
    );
    model.put_variable(Variable::new("PRENOM", "G1", VariableType::String));
    model
}

fn capi_model() -> MetadataModel {
    let mut model = base_model();
    model.put_variable(Variable::new("AGE2", ROOT_GROUP_NAME, VariableType::Integer));
    model
}

fn paper_model() -> MetadataModel {
    let mut model = base_model();
    for (name, value) in [("SEXE_1", "1"), ("SEXE_2", "2")] {
        model.put_variable(
            Variable::new(name, ROOT_GROUP_NAME, VariableType::Boolean).with_kind(
                VariableKind::PaperUcq {
                    ucq_name: "SEXE".to_string(),
                    modality_value: value.to_string(),
                },
            ),
        );
    }
    model
}

fn context() -> PipelineContext {
    let mut context = PipelineContext::new();
    let calculated: CalculatedVariables =
        std::iter::once(CalculatedVariable::new("AGE2", "AGE * 2").with_dependencies(["AGE"]))
            .collect();
    context
        .register_metadata("CAPI", capi_model(), calculated)
        .unwrap();
    context
        .register_metadata("PAPER", paper_model(), CalculatedVariables::default())
        .unwrap();

    context.bind(
        "CAPI",
        Dataset::new(
            df!(
                "IdUE" => ["C1", "C1", "C1"],
                "G1" => ["", "G1-1", "G1-2"],
                "AGE" => [30i64, 30, 30],
                "SEXE" => ["1", "1", "1"],
                "PRENOM" => [None, Some("Ana"), Some("Bob")]
            )
            .unwrap(),
            ["IdUE", "G1"],
        ),
    );
    context.bind(
        "PAPER",
        Dataset::new(
            df!(
                "IdUE" => ["P1"],
                "G1" => [""],
                "AGE" => [50i64],
                "SEXE" => [None::<&str>],
                "SEXE_1" => ["0"],
                "SEXE_2" => ["1"],
                "PRENOM" => [None::<&str>]
            )
            .unwrap(),
            ["IdUE", "G1"],
        ),
    );
    context
}

fn modes() -> Vec<ModeSpec> {
    vec![
        ModeSpec::new("CAPI", DataFormat::Lunatic),
        ModeSpec::new("PAPER", DataFormat::Paper),
    ]
}

#[test]
fn unimodal_stage_prefixes_and_derives() {
    let mut context = context();
    let engine = PolarsEngine::new();
    let report = context.run_unimodal(&modes(), &engine).unwrap();
    assert_eq!(report.issue_count(), 0, "{:?}", context.issues);

    let capi = context.bindings.get("CAPI").unwrap();
    assert!(capi.has_column("G1.PRENOM"));
    assert_eq!(column_value_string(capi.data(), "AGE2", 0), "60");

    let paper = context.bindings.get("PAPER").unwrap();
    assert_eq!(column_value_string(paper.data(), "SEXE", 0), "2");
}

#[test]
fn multimodal_stage_produces_information_levels() {
    let mut context = context();
    let engine = PolarsEngine::new();
    context.run_unimodal(&modes(), &engine).unwrap();
    let report = context
        .run_multimodal(&modes(), &MultimodalScripts::default(), &engine)
        .unwrap();
    assert!(context.issues.is_empty(), "{:?}", context.issues);
    let steps: Vec<&str> = report.steps.iter().map(|s| s.step.as_str()).collect();
    assert_eq!(
        steps,
        ["reconciliation", "clean up", "transformations", "information levels"]
    );

    assert_eq!(
        context.bindings.names(),
        ["G1", MULTIMODE_DATASET_NAME, ROOT_GROUP_NAME]
    );

    let multimode = context.bindings.get(MULTIMODE_DATASET_NAME).unwrap();
    assert_eq!(multimode.height(), 4);
    assert!(!multimode.has_column("SEXE_1"));
    assert_eq!(multimode.role("MODE"), Some(Role::Identifier));
    assert_eq!(multimode.column_type("AGE"), Some(&DataType::Float64));
    let paper_row = (0..4)
        .find(|&i| column_value_string(multimode.data(), "MODE", i) == "PAPER")
        .unwrap();
    assert_eq!(column_value_string(multimode.data(), "AGE2", paper_row), "");

    let root = context.bindings.get(ROOT_GROUP_NAME).unwrap();
    assert_eq!(root.height(), 2);
    assert_eq!(root.column_names(), ["IdUE", "AGE", "SEXE", "AGE2", "MODE"]);

    let g1 = context.bindings.get("G1").unwrap();
    assert_eq!(g1.column_names(), ["IdUE", "G1", "PRENOM", "MODE"]);
    let prenoms: Vec<String> = (0..g1.height())
        .map(|i| column_value_string(g1.data(), "PRENOM", i))
        .collect();
    assert_eq!(prenoms, ["Ana", "Bob"]);

    assert_eq!(
        context.information_level_names().unwrap(),
        [ROOT_GROUP_NAME, "G1"]
    );
    assert!(
        context
            .metadata("PAPER")
            .unwrap()
            .paper_ucq_names()
            .is_empty()
    );
}

#[test]
fn single_mode_reconciliation_is_the_identity() {
    let mut context = PipelineContext::new();
    context
        .register_metadata("CAWI", base_model(), CalculatedVariables::default())
        .unwrap();
    let data = df!("IdUE" => ["W1", "W2"], "AGE" => [20i64, 21]).unwrap();
    context.bind("CAWI", Dataset::new(data.clone(), ["IdUE"]));

    let engine = PolarsEngine::new();
    context
        .run_multimodal(
            &[ModeSpec::new("CAWI", DataFormat::Lunatic)],
            &MultimodalScripts::default(),
            &engine,
        )
        .unwrap();
    let multimode = context.bindings.get(MULTIMODE_DATASET_NAME).unwrap();
    assert!(multimode.data().equals_missing(&data));
    assert!(!context.bindings.contains("CAWI"));
}

#[test]
fn measure_shared_by_some_modes_keeps_every_value() {
    let mut bindings = Bindings::new();
    for (mode, data) in [
        ("A", df!("IdUE" => ["a1"], "FOO" => ["fa"], "X" => ["ax"]).unwrap()),
        ("B", df!("IdUE" => ["b1"], "FOO" => ["fb"], "X" => ["bx"]).unwrap()),
        ("C", df!("IdUE" => ["c1"], "FOO" => ["fc"]).unwrap()),
    ] {
        bindings.insert(mode, Dataset::new(data, ["IdUE"]));
    }

    let statements = ReconciliationStep::new(["A", "B", "C"])
        .generate(MULTIMODE_DATASET_NAME, &mut bindings)
        .unwrap();
    let mut issues = Vec::new();
    PolarsEngine::new()
        .execute(&statements, &mut bindings, &mut issues)
        .unwrap();
    assert!(issues.is_empty(), "{issues:?}");

    let multimode = bindings.get(MULTIMODE_DATASET_NAME).unwrap();
    assert_eq!(multimode.column_names(), ["IdUE", "FOO", "MODE", "X"]);
    let column = |name: &str| -> Vec<String> {
        (0..multimode.height())
            .map(|row| column_value_string(multimode.data(), name, row))
            .collect()
    };
    assert_eq!(column("MODE"), ["A", "B", "C"]);
    assert_eq!(column("X"), ["ax", "bx", ""]);
    assert_eq!(multimode.role("MODE"), Some(Role::Identifier));
}
