//! Parsing and rendering of statements.

use harmonia_transform::{CalcItem, Clause, DatasetExpr, Operand, Role, Statement, parse_script};

#[test]
fn parses_user_script_with_comments() {
    let script = r#"
/* reconciliation fixes */
CAPI := CAPI [rename A to G.A]; // trailing note
MULTIMODE := union(A, B [keep X, Y]);
X := left_join(A, B);
T := T [calc identifier ID := "x;y", M := 1];
not a statement;
"#;
    let statements = parse_script(script);
    assert_eq!(
        statements,
        vec![
            Statement::rename("CAPI", "A", "G.A"),
            Statement::union(
                "MULTIMODE",
                vec![Operand::new("A"), Operand::keep("B", ["X", "Y"])]
            ),
            Statement::left_join("X", Operand::new("A"), Operand::new("B")),
            Statement::assign(
                "T",
                DatasetExpr::Operand(Operand::with_clause(
                    "T",
                    Clause::Calc(vec![
                        CalcItem {
                            role: Role::Identifier,
                            target: "ID".to_string(),
                            expression: "\"x;y\"".to_string(),
                        },
                        CalcItem {
                            role: Role::Measure,
                            target: "M".to_string(),
                            expression: "1".to_string(),
                        },
                    ]),
                )),
            ),
            Statement::script("not a statement"),
        ]
    );
}

#[test]
fn rendered_statements_parse_back() {
    let statements = vec![
        Statement::alias("MULTIMODE", "CAPI"),
        Statement::keep("G1", "MULTIMODE", ["IdUE", "G1", "G1.PRENOM"]),
        Statement::drop_columns("MULTIMODE", ["SEXE_1", "SEXE_2"]),
        Statement::filter("G1", "G1 <> \"\""),
        Statement::calc_identifier("CAPI", "MODE", "\"CAPI\""),
        Statement::rename_all(
            "G1",
            vec![("G1.A".to_string(), "A".to_string()), ("G1.B".to_string(), "B".to_string())],
        ),
    ];
    let script: String = statements.iter().map(|s| format!("{s}\n")).collect();
    assert_eq!(parse_script(&script), statements);
}

#[test]
fn unsupported_syntax_is_kept_verbatim() {
    assert_eq!(
        Statement::parse("A := B [sort X]"),
        Statement::script("A := B [sort X]")
    );
    assert_eq!(
        Statement::parse("A := left_join(B)"),
        Statement::script("A := left_join(B)")
    );
    assert_eq!(
        Statement::parse("A := B [keep]"),
        Statement::script("A := B [keep]")
    );
    assert_eq!(Statement::parse("1A := B"), Statement::script("1A := B"));
}

#[test]
fn blank_and_comment_only_scripts_are_empty() {
    assert!(parse_script("").is_empty());
    assert!(parse_script("  ;\n ; // nothing\n/* still nothing */").is_empty());
}

#[test]
fn statement_target() {
    assert_eq!(Statement::alias("A", "B").target(), Some("A"));
    assert_eq!(Statement::script("x").target(), None);
}

#[test]
fn calc_measure_renders_without_role() {
    insta::assert_snapshot!(
        Statement::calc("CAPI", "X", "cast(X, number)").to_string(),
        @"CAPI := CAPI [calc X := cast(X, number)];"
    );
}
