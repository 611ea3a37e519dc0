//! Statement execution against polars frames.

use harmonia_engine::{PolarsEngine, column_value_string, parse_expression};
use harmonia_transform::{Bindings, Dataset, ExecutionEngine, Issue, Operand, Role, Statement};
use polars::prelude::*;

fn bindings_with(name: &str, data: DataFrame, identifiers: &[&str]) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.insert(name, Dataset::new(data, identifiers.iter().copied()));
    bindings
}

fn run(statements: &[Statement], bindings: &mut Bindings) -> Vec<Issue> {
    let mut issues = Vec::new();
    PolarsEngine::new()
        .execute(statements, bindings, &mut issues)
        .unwrap();
    issues
}

fn names(dataset: &Dataset) -> Vec<String> {
    dataset.column_names()
}

#[test]
fn rename_carries_identifier_role() {
    let mut bindings = bindings_with(
        "CAPI",
        df!("IdUE" => ["1"], "G1" => ["a"], "PRENOM" => ["Ana"]).unwrap(),
        &["IdUE", "G1"],
    );
    let issues = run(
        &[
            Statement::rename("CAPI", "PRENOM", "G1.PRENOM"),
            Statement::rename("CAPI", "G1", "LOOP"),
        ],
        &mut bindings,
    );
    assert!(issues.is_empty());
    let capi = bindings.get("CAPI").unwrap();
    assert_eq!(names(capi), ["IdUE", "LOOP", "G1.PRENOM"]);
    assert_eq!(capi.role("LOOP"), Some(Role::Identifier));
    assert_eq!(capi.role("G1.PRENOM"), Some(Role::Measure));
}

#[test]
fn rename_onto_existing_column_is_an_issue() {
    let mut bindings = bindings_with(
        "CAPI",
        df!("IdUE" => ["1"], "A" => ["x"], "B" => ["y"]).unwrap(),
        &["IdUE"],
    );
    let issues = run(&[Statement::rename("CAPI", "A", "B")], &mut bindings);
    assert_eq!(issues.len(), 1);
    assert_eq!(names(bindings.get("CAPI").unwrap()), ["IdUE", "A", "B"]);
}

#[test]
fn failures_are_recorded_and_execution_continues() {
    let mut bindings = bindings_with("CAPI", df!("IdUE" => ["1"]).unwrap(), &["IdUE"]);
    let issues = run(
        &[
            Statement::keep("X", "CAPI", ["NOPE"]),
            Statement::alias("Y", "MISSING"),
            Statement::script("CAPI := CAPI [sort IdUE]"),
            Statement::calc("CAPI", "Z", "frobnicate(IdUE)"),
            Statement::alias("COPY", "CAPI"),
        ],
        &mut bindings,
    );
    assert_eq!(issues.len(), 4);
    assert!(matches!(&issues[0], Issue::Execution { message, .. } if message.contains("NOPE")));
    assert!(bindings.contains("COPY"));
    assert!(!bindings.contains("X"));
}

#[test]
fn calc_evaluates_against_the_input_frame() {
    let mut bindings = bindings_with(
        "PAPER",
        df!(
            "IdUE" => ["1", "2", "3"],
            "SEXE_1" => ["1", "0", "0"],
            "SEXE_2" => ["0", "1", "0"],
            "AGE" => [Some(30i64), None, Some(41)]
        )
        .unwrap(),
        &["IdUE"],
    );
    let issues = run(
        &[
            Statement::calc(
                "PAPER",
                "SEXE",
                r#"if SEXE_1 = "1" then "1" else if SEXE_2 = "1" then "2" else """#,
            ),
            Statement::calc("PAPER", "AGE", "cast(nvl(AGE, 0), number) / 2"),
            Statement::calc_identifier("PAPER", "MODE", "\"PAPER\""),
        ],
        &mut bindings,
    );
    assert!(issues.is_empty(), "{issues:?}");
    let paper = bindings.get("PAPER").unwrap();
    let data = paper.data();
    let sexe: Vec<String> = (0..3).map(|i| column_value_string(data, "SEXE", i)).collect();
    assert_eq!(sexe, ["1", "2", ""]);
    assert_eq!(paper.column_type("AGE"), Some(&DataType::Float64));
    assert_eq!(
        data.column("AGE").unwrap().get(2).unwrap(),
        AnyValue::Float64(20.5)
    );
    assert_eq!(paper.role("MODE"), Some(Role::Identifier));
    assert_eq!(column_value_string(data, "MODE", 2), "PAPER");
}

#[test]
fn filter_keeps_matching_rows() {
    let mut bindings = bindings_with(
        "M",
        df!("IdUE" => ["1", "1", "2"], "G1" => [Some(""), Some("G1-1"), None]).unwrap(),
        &["IdUE", "G1"],
    );
    let issues = run(&[Statement::filter("M", "G1 <> \"\"")], &mut bindings);
    assert!(issues.is_empty());
    let m = bindings.get("M").unwrap();
    assert_eq!(m.height(), 1);
    assert_eq!(column_value_string(m.data(), "G1", 0), "G1-1");
}

#[test]
fn union_fills_missing_columns_and_removes_duplicates() {
    let mut bindings = Bindings::new();
    bindings.insert(
        "A",
        Dataset::new(df!("IdUE" => ["1", "1"], "X" => ["a", "a"]).unwrap(), ["IdUE"]),
    );
    bindings.insert(
        "B",
        Dataset::new(df!("IdUE" => ["2"], "Y" => ["b"]).unwrap(), ["IdUE"]),
    );
    let issues = run(
        &[Statement::union(
            "U",
            vec![Operand::new("A"), Operand::new("B")],
        )],
        &mut bindings,
    );
    assert!(issues.is_empty());
    let u = bindings.get("U").unwrap();
    assert_eq!(u.height(), 2);
    assert_eq!(names(u), ["IdUE", "X", "Y"]);
    assert!(u.data().column("X").unwrap().get(1).unwrap().is_null());
    assert_eq!(u.identifier_names(), ["IdUE"]);
}

#[test]
fn self_union_deduplicates() {
    let mut bindings = bindings_with(
        "R",
        df!("IdUE" => ["1", "1", "2"], "AGE" => ["30", "30", "40"]).unwrap(),
        &["IdUE"],
    );
    run(
        &[Statement::union("R", vec![Operand::new("R"), Operand::new("R")])],
        &mut bindings,
    );
    assert_eq!(bindings.get("R").unwrap().height(), 2);
}

#[test]
fn left_join_keeps_left_rows_in_order() {
    let mut bindings = Bindings::new();
    bindings.insert(
        "L",
        Dataset::new(
            df!("IdUE" => ["3", "1", "2"], "MODE" => ["CAPI", "CAPI", "CAWI"]).unwrap(),
            ["IdUE", "MODE"],
        ),
    );
    bindings.insert(
        "R",
        Dataset::new(
            df!("IdUE" => ["1", "3"], "MODE" => ["CAPI", "CAPI"], "X" => ["one", "three"])
                .unwrap(),
            ["IdUE", "MODE"],
        ),
    );
    let issues = run(
        &[Statement::left_join("J", Operand::new("L"), Operand::new("R"))],
        &mut bindings,
    );
    assert!(issues.is_empty(), "{issues:?}");
    let j = bindings.get("J").unwrap();
    assert_eq!(names(j), ["IdUE", "MODE", "X"]);
    let ids: Vec<String> = (0..3).map(|i| column_value_string(j.data(), "IdUE", i)).collect();
    let xs: Vec<String> = (0..3).map(|i| column_value_string(j.data(), "X", i)).collect();
    assert_eq!(ids, ["3", "1", "2"]);
    assert_eq!(xs, ["three", "one", ""]);
}

#[test]
fn left_join_without_shared_identifiers_is_an_issue() {
    let mut bindings = Bindings::new();
    bindings.insert("L", Dataset::new(df!("A" => ["1"]).unwrap(), ["A"]));
    bindings.insert("R", Dataset::new(df!("B" => ["1"]).unwrap(), ["B"]));
    let issues = run(
        &[Statement::left_join("J", Operand::new("L"), Operand::new("R"))],
        &mut bindings,
    );
    assert_eq!(issues.len(), 1);
}

#[test]
fn parsed_user_scripts_execute() {
    let mut bindings = bindings_with(
        "MULTIMODE",
        df!("IdUE" => ["1", "2"], "NOM" => ["dupont", "martin"]).unwrap(),
        &["IdUE"],
    );
    let script = r#"
        MULTIMODE := MULTIMODE [calc NOM_MAJ := upper(NOM) || "!"];
        MULTIMODE := MULTIMODE [drop NOM];
    "#;
    let issues = run(&harmonia_transform::parse_script(script), &mut bindings);
    assert!(issues.is_empty(), "{issues:?}");
    let m = bindings.get("MULTIMODE").unwrap();
    assert_eq!(names(m), ["IdUE", "NOM_MAJ"]);
    assert_eq!(column_value_string(m.data(), "NOM_MAJ", 1), "MARTIN!");
}

#[test]
fn expressions_support_boolean_logic() {
    let df = df!("A" => [1i64, 2, 3], "B" => [Some("x"), None, Some("y")]).unwrap();
    let expr = parse_expression("(A >= 2 and not isnull(B)) or A = 1").unwrap();
    let out = df.lazy().filter(expr).collect().unwrap();
    assert_eq!(out.height(), 2);
}
