//! Output tables, error file and snapshots on disk.

use std::fs;

use harmonia_model::constants::ROOT_GROUP_NAME;
use harmonia_model::{
    CalculatedVariable, CalculatedVariables, Group, MetadataModel, Variable, VariableType,
};
use harmonia_output::{
    ERROR_FILE_NAME, MANIFEST_FILE_NAME, OutputError, load_state, render_issues, save_state,
    write_outputs,
};
use harmonia_transform::{Dataset, Issue, PipelineContext, Role};
use polars::prelude::*;
use tempfile::TempDir;

fn metadata() -> MetadataModel {
    let mut model = MetadataModel::new();
    model.put_group(Group::new("G1", ROOT_GROUP_NAME));
    model.put_variable(
        Variable::new("SEXE", ROOT_GROUP_NAME, VariableType::String).with_length(1),
    );
    model.put_variable(Variable::new("PRENOM", "G1", VariableType::String).with_length(3));
    model
}

fn context(prenoms: [&str; 2]) -> PipelineContext {
    let mut context = PipelineContext::new();
    context
        .register_metadata("CAWI", metadata(), CalculatedVariables::default())
        .unwrap();
    context.bind(
        ROOT_GROUP_NAME,
        Dataset::new(
            df!("IdUE" => ["W1", "W2"], "SEXE" => [Some("1"), None], "MODE" => ["CAWI", "CAWI"])
                .unwrap(),
            ["IdUE", "MODE"],
        ),
    );
    context.bind(
        "G1",
        Dataset::new(
            df!(
                "IdUE" => ["W1", "W1"],
                "G1" => ["G1-1", "G1-2"],
                "PRENOM" => prenoms,
                "MODE" => ["CAWI", "CAWI"]
            )
            .unwrap(),
            ["IdUE", "G1", "MODE"],
        ),
    );
    context
}

#[test]
fn one_semicolon_table_per_information_level() {
    let dir = TempDir::new().unwrap();
    let mut context = context(["Ana", "Bob"]);
    let summary = write_outputs(&mut context, "SAMPLE", dir.path()).unwrap();

    let levels: Vec<&str> = summary.tables.iter().map(|t| t.level.as_str()).collect();
    assert_eq!(levels, [ROOT_GROUP_NAME, "G1"]);
    assert_eq!(summary.tables[1].rows, 2);

    let root = fs::read_to_string(dir.path().join("SAMPLE_RACINE.csv")).unwrap();
    let lines: Vec<&str> = root.lines().collect();
    assert_eq!(lines, ["IdUE;SEXE;MODE", "W1;1;CAWI", "W2;;CAWI"]);
    assert!(dir.path().join("SAMPLE_G1.csv").is_file());

    assert!(context.issues.is_empty());
    assert!(summary.error_file.is_none());
    assert!(!dir.path().join(ERROR_FILE_NAME).exists());
}

#[test]
fn overlong_values_produce_a_length_warning_and_error_file() {
    let dir = TempDir::new().unwrap();
    let mut context = context(["Ana", "Bobby"]);
    let summary = write_outputs(&mut context, "SAMPLE", dir.path()).unwrap();

    assert_eq!(
        context.issues,
        [Issue::VariableLength {
            dataset: "G1".to_string(),
            variable: "PRENOM".to_string(),
            declared: 3,
            observed: 5,
        }]
    );
    let path = summary.error_file.unwrap();
    let content = fs::read_to_string(path).unwrap();
    assert!(content.contains("[WARN] G1.PRENOM: observed length 5 exceeds declared length 3"));
}

#[test]
fn rendered_issues_carry_a_header_and_severity() {
    let issues = [Issue::execution("X := Y;", "dataset 'Y' does not exist")];
    let rendered = render_issues(&issues, "2024-01-01 00:00:00");
    assert_eq!(
        rendered,
        "Issues found during processing (2024-01-01 00:00:00)\n\n\
         [ERROR] statement failed: X := Y; (dataset 'Y' does not exist)\n"
    );
}

#[test]
fn snapshots_restore_bindings_roles_and_state() {
    let dir = TempDir::new().unwrap();
    let mut context = context(["Ana", "Bob"]);
    context.bind(
        "MULTIMODE",
        Dataset::new(
            df!(
                "IdUE" => ["W1", "W2"],
                "AGE" => [Some(30i64), None],
                "TAILLE" => [1.75f64, 1.62],
                "MODE" => ["CAWI", "CAWI"]
            )
            .unwrap(),
            ["IdUE", "MODE"],
        ),
    );
    context.issues.push(Issue::execution("A := B;", "boom"));
    let calculated: CalculatedVariables =
        std::iter::once(CalculatedVariable::new("AGE2", "AGE * 2")).collect();
    context
        .register_metadata("CAPI", metadata(), calculated.clone())
        .unwrap();

    let parts = context.into_parts();
    save_state(dir.path(), &parts).unwrap();
    assert!(dir.path().join(MANIFEST_FILE_NAME).is_file());

    let restored = load_state(dir.path()).unwrap();
    assert_eq!(restored.bindings.names(), parts.bindings.names());
    for (name, dataset) in parts.bindings.iter() {
        let loaded = restored.bindings.get(name).unwrap();
        assert!(loaded.data().equals_missing(dataset.data()), "{name}");
        assert_eq!(loaded.identifier_names(), dataset.identifier_names());
    }
    let multimode = restored.bindings.get("MULTIMODE").unwrap();
    assert_eq!(multimode.column_type("AGE"), Some(&DataType::Int64));
    assert_eq!(multimode.role("MODE"), Some(Role::Identifier));
    assert_eq!(restored.issues, parts.issues);
    assert_eq!(restored.metadata, parts.metadata);
    assert_eq!(restored.calculated.get("CAPI"), Some(&calculated));

    let context = PipelineContext::from_parts(restored);
    assert!(context.metadata("CAWI").is_some());
}

#[test]
fn loading_without_manifest_fails() {
    let dir = TempDir::new().unwrap();
    let err = load_state(dir.path()).unwrap_err();
    assert!(matches!(err, OutputError::MissingSnapshot { .. }));
}
