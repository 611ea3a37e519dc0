//! Full and step-by-step runs over a two-mode campaign on disk.

use std::fs;
use std::path::Path;

use harmonia_cli::pipeline::{StageKind, default_state_dir, run_campaign, run_stage};
use harmonia_ingest::load_campaign;
use tempfile::TempDir;

const CAPI_METADATA: &str = r#"{
  "groups": [{ "name": "G1", "parent_name": "RACINE" }],
  "variables": [
    { "name": "AGE", "group_name": "RACINE", "type": "INTEGER" },
    { "name": "SEXE", "group_name": "RACINE", "type": "STRING",
      "kind": { "type": "ucq", "modalities": [{ "value": "1" }, { "value": "2" }] } },
    { "name": "PRENOM", "group_name": "G1", "type": "STRING" }
  ],
  "calculated": [
    { "name": "AGE2", "expression": "AGE * 2", "dependencies": ["AGE"] }
  ]
}"#;

const PAPER_METADATA: &str = r#"{
  "groups": [{ "name": "G1", "parent_name": "RACINE" }],
  "variables": [
    { "name": "AGE", "group_name": "RACINE", "type": "INTEGER" },
    { "name": "SEXE", "group_name": "RACINE", "type": "STRING",
      "kind": { "type": "ucq", "modalities": [{ "value": "1" }, { "value": "2" }] } },
    { "name": "SEXE_1", "group_name": "RACINE", "type": "BOOLEAN",
      "kind": { "type": "paper_ucq", "ucq_name": "SEXE", "modality_value": "1" } },
    { "name": "SEXE_2", "group_name": "RACINE", "type": "BOOLEAN",
      "kind": { "type": "paper_ucq", "ucq_name": "SEXE", "modality_value": "2" } },
    { "name": "PRENOM", "group_name": "G1", "type": "STRING" }
  ]
}"#;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn campaign_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "capi.json", CAPI_METADATA);
    write(dir.path(), "paper.json", PAPER_METADATA);
    write(
        dir.path(),
        "capi.csv",
        "IdUE,G1,AGE,SEXE,PRENOM\nC1,,30,1,\nC1,G1-1,,,Ana\nC1,G1-2,,,Bob\n",
    );
    write(dir.path(), "paper.csv", "IdUE;AGE;SEXE_1;SEXE_2\nP1;50;0;1\n");
    write(
        dir.path(),
        "campaign.json",
        r#"{
          "campaign": "SAMPLETEST",
          "modes": [
            { "name": "CAPI", "data_format": "LUNATIC",
              "data_file": "capi.csv", "metadata_file": "capi.json" },
            { "name": "PAPER", "data_format": "PAPER",
              "data_file": "paper.csv", "metadata_file": "paper.json" }
          ]
        }"#,
    );
    dir
}

#[test]
fn full_run_writes_one_table_per_level() {
    let dir = campaign_dir();
    let campaign_file = dir.path().join("campaign.json");
    let config = load_campaign(&campaign_file).unwrap();
    let output_dir = dir.path().join("output");

    let mut seen = Vec::new();
    let result = run_campaign(&config, &output_dir, |stage| seen.push(stage)).unwrap();
    assert_eq!(seen, StageKind::ALL);
    assert!(!result.has_issues(), "{:?}", result.issues);

    let names: Vec<&str> = result.bindings.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["G1", "MULTIMODE", "RACINE"]);

    let root = fs::read_to_string(output_dir.join("SAMPLETEST_RACINE.csv")).unwrap();
    let lines: Vec<&str> = root.lines().collect();
    assert_eq!(lines[0], "IdUE;AGE;SEXE;AGE2;MODE");
    assert_eq!(lines.len(), 3);
    assert!(lines[2].starts_with("P1;"));
    assert!(lines[2].ends_with(";2;;PAPER"));

    let group = fs::read_to_string(output_dir.join("SAMPLETEST_G1.csv")).unwrap();
    assert_eq!(
        group.lines().collect::<Vec<_>>(),
        ["IdUE;G1;PRENOM;MODE", "C1;G1-1;Ana;CAPI", "C1;G1-2;Bob;CAPI"]
    );
    assert!(!output_dir.join("errors.txt").exists());
}

#[test]
fn step_by_step_run_matches_full_run() {
    let dir = campaign_dir();
    let campaign_file = dir.path().join("campaign.json");
    let config = load_campaign(&campaign_file).unwrap();

    let full_dir = dir.path().join("full");
    run_campaign(&config, &full_dir, |_| {}).unwrap();

    let state_dir = default_state_dir(&campaign_file);
    let step_dir = dir.path().join("steps");
    let mut last = None;
    for stage in StageKind::ALL {
        last = Some(run_stage(stage, &config, &state_dir, &step_dir).unwrap());
    }
    let last = last.unwrap();
    assert_eq!(last.state_dir.as_deref(), Some(state_dir.as_path()));
    assert_eq!(last.output.unwrap().tables.len(), 2);

    for level in ["RACINE", "G1"] {
        let file = format!("SAMPLETEST_{level}.csv");
        assert_eq!(
            fs::read_to_string(full_dir.join(&file)).unwrap(),
            fs::read_to_string(step_dir.join(&file)).unwrap(),
            "{file}"
        );
    }
}

#[test]
fn stage_without_saved_state_fails() {
    let dir = campaign_dir();
    let config = load_campaign(&dir.path().join("campaign.json")).unwrap();
    let err = run_stage(
        StageKind::Unimodal,
        &config,
        &dir.path().join("missing"),
        &dir.path().join("output"),
    )
    .unwrap_err();
    assert!(format!("{err:#}").contains("load state"));
}

#[test]
fn unreadable_user_script_is_reported_as_issue() {
    let dir = campaign_dir();
    write(
        dir.path(),
        "campaign.json",
        r#"{
          "campaign": "SAMPLETEST",
          "modes": [
            { "name": "CAPI", "data_file": "capi.csv", "metadata_file": "capi.json",
              "script": "missing.vtl" }
          ]
        }"#,
    );
    let config = load_campaign(&dir.path().join("campaign.json")).unwrap();
    let output_dir = dir.path().join("output");
    let result = run_campaign(&config, &output_dir, |_| {}).unwrap();
    assert_eq!(result.issues.len(), 1);
    assert!(output_dir.join("errors.txt").is_file());
}
