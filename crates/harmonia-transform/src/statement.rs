//! Dataset statements exchanged between generators and the execution engine.
//!
//! Generators build statements with the constructors on [`Statement`]; user
//! scripts are read with [`parse_script`]. The textual form mirrors the
//! assignment syntax used in user scripts:
//!
//! ```text
//! CAPI := CAPI [rename AGE to G1.AGE];
//! MULTIMODE := union(CAPI [keep IdUE, X, MODE], CAWI [keep IdUE, X, MODE]);
//! MULTIMODE := left_join(MULTIMODE, CAPI_keep);
//! ```
//!
//! Text the parser does not understand is kept verbatim as
//! [`Statement::Script`] so the engine can report it.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::bindings::Role;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("Invalid identifier regex"));

static OPERAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_.]*)\s*(?:\[(.*)\])?$").expect("Invalid operand regex")
});

static FUNCTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(union|left_join)\s*\((.*)\)$").expect("Invalid function regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `target := value;`
    Assign { target: String, value: DatasetExpr },
    /// Statement text outside the supported grammar.
    Script(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetExpr {
    Operand(Operand),
    Union(Vec<Operand>),
    LeftJoin(Operand, Operand),
}

/// A dataset reference with an optional clause applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub dataset: String,
    pub clause: Option<Clause>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Keep(Vec<String>),
    Drop(Vec<String>),
    Rename(Vec<(String, String)>),
    Filter(String),
    Calc(Vec<CalcItem>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcItem {
    pub role: Role,
    pub target: String,
    pub expression: String,
}

impl Operand {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            clause: None,
        }
    }

    pub fn with_clause(dataset: impl Into<String>, clause: Clause) -> Self {
        Self {
            dataset: dataset.into(),
            clause: Some(clause),
        }
    }

    pub fn keep<I, S>(dataset: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_clause(
            dataset,
            Clause::Keep(columns.into_iter().map(Into::into).collect()),
        )
    }
}

impl Statement {
    pub fn assign(target: impl Into<String>, value: DatasetExpr) -> Self {
        Statement::Assign {
            target: target.into(),
            value,
        }
    }

    /// `target := source;`
    pub fn alias(target: impl Into<String>, source: impl Into<String>) -> Self {
        Self::assign(target, DatasetExpr::Operand(Operand::new(source)))
    }

    /// `target := source [keep columns];`
    pub fn keep<I, S>(target: impl Into<String>, source: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::assign(target, DatasetExpr::Operand(Operand::keep(source, columns)))
    }

    /// `dataset := dataset [drop columns];`
    pub fn drop_columns<I, S>(dataset: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::in_place(
            dataset,
            Clause::Drop(columns.into_iter().map(Into::into).collect()),
        )
    }

    /// `dataset := dataset [rename from to to];`
    pub fn rename(dataset: &str, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::in_place(dataset, Clause::Rename(vec![(from.into(), to.into())]))
    }

    pub fn rename_all(dataset: &str, pairs: Vec<(String, String)>) -> Self {
        Self::in_place(dataset, Clause::Rename(pairs))
    }

    /// `dataset := dataset [filter condition];`
    pub fn filter(dataset: &str, condition: impl Into<String>) -> Self {
        Self::in_place(dataset, Clause::Filter(condition.into()))
    }

    /// `dataset := dataset [calc target := expression];`
    pub fn calc(dataset: &str, target: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::calc_with_role(dataset, Role::Measure, target, expression)
    }

    /// `dataset := dataset [calc identifier target := expression];`
    pub fn calc_identifier(
        dataset: &str,
        target: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self::calc_with_role(dataset, Role::Identifier, target, expression)
    }

    pub fn union(target: impl Into<String>, operands: Vec<Operand>) -> Self {
        Self::assign(target, DatasetExpr::Union(operands))
    }

    pub fn left_join(target: impl Into<String>, left: Operand, right: Operand) -> Self {
        Self::assign(target, DatasetExpr::LeftJoin(left, right))
    }

    pub fn script(text: impl Into<String>) -> Self {
        Statement::Script(text.into())
    }

    /// Binding written by the statement, when it can be known.
    pub fn target(&self) -> Option<&str> {
        match self {
            Statement::Assign { target, .. } => Some(target),
            Statement::Script(_) => None,
        }
    }

    fn calc_with_role(
        dataset: &str,
        role: Role,
        target: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self::in_place(
            dataset,
            Clause::Calc(vec![CalcItem {
                role,
                target: target.into(),
                expression: expression.into(),
            }]),
        )
    }

    fn in_place(dataset: &str, clause: Clause) -> Self {
        Self::assign(
            dataset,
            DatasetExpr::Operand(Operand::with_clause(dataset, clause)),
        )
    }

    /// Parses a single statement, without its terminating `;`.
    pub fn parse(text: &str) -> Statement {
        let text = text.trim();
        parse_assignment(text).unwrap_or_else(|| Statement::Script(text.to_string()))
    }
}

/// Splits a user script into statements.
///
/// Line (`//`) and block (`/* */`) comments are removed first; empty
/// statements are skipped.
pub fn parse_script(text: &str) -> Vec<Statement> {
    let stripped = strip_comments(text);
    split_top_level(&stripped, ';')
        .into_iter()
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(Statement::parse)
        .collect()
}

fn parse_assignment(text: &str) -> Option<Statement> {
    let split = find_top_level(text, ":=")?;
    let target = text[..split].trim();
    if !IDENTIFIER_REGEX.is_match(target) {
        return None;
    }
    let value = parse_dataset_expr(text[split + 2..].trim())?;
    Some(Statement::assign(target, value))
}

fn parse_dataset_expr(text: &str) -> Option<DatasetExpr> {
    if let Some(captures) = FUNCTION_REGEX.captures(text) {
        let operands = split_top_level(captures.get(2)?.as_str(), ',')
            .into_iter()
            .map(parse_operand)
            .collect::<Option<Vec<_>>>()?;
        return match captures.get(1)?.as_str().to_ascii_lowercase().as_str() {
            "union" if !operands.is_empty() => Some(DatasetExpr::Union(operands)),
            "left_join" if operands.len() == 2 => {
                let mut operands = operands.into_iter();
                let left = operands.next()?;
                let right = operands.next()?;
                Some(DatasetExpr::LeftJoin(left, right))
            }
            _ => None,
        };
    }
    parse_operand(text).map(DatasetExpr::Operand)
}

fn parse_operand(text: &str) -> Option<Operand> {
    let captures = OPERAND_REGEX.captures(text.trim())?;
    let dataset = captures.get(1)?.as_str();
    match captures.get(2) {
        Some(clause) => Some(Operand::with_clause(dataset, parse_clause(clause.as_str())?)),
        None => Some(Operand::new(dataset)),
    }
}

fn parse_clause(text: &str) -> Option<Clause> {
    let text = text.trim();
    let (keyword, rest) = match text.find(char::is_whitespace) {
        Some(index) => (&text[..index], text[index..].trim()),
        None => (text, ""),
    };
    match keyword.to_ascii_lowercase().as_str() {
        "keep" => parse_names(rest).map(Clause::Keep),
        "drop" => parse_names(rest).map(Clause::Drop),
        "rename" => parse_renames(rest).map(Clause::Rename),
        "filter" if !rest.is_empty() => Some(Clause::Filter(rest.to_string())),
        "calc" => parse_calcs(rest).map(Clause::Calc),
        _ => None,
    }
}

fn parse_names(text: &str) -> Option<Vec<String>> {
    split_top_level(text, ',')
        .into_iter()
        .map(str::trim)
        .map(|name| IDENTIFIER_REGEX.is_match(name).then(|| name.to_string()))
        .collect()
}

fn parse_renames(text: &str) -> Option<Vec<(String, String)>> {
    split_top_level(text, ',')
        .into_iter()
        .map(|item| {
            let tokens: Vec<&str> = item.split_whitespace().collect();
            match tokens.as_slice() {
                [from, to_keyword, to]
                    if to_keyword.eq_ignore_ascii_case("to")
                        && IDENTIFIER_REGEX.is_match(from)
                        && IDENTIFIER_REGEX.is_match(to) =>
                {
                    Some(((*from).to_string(), (*to).to_string()))
                }
                _ => None,
            }
        })
        .collect()
}

fn parse_calcs(text: &str) -> Option<Vec<CalcItem>> {
    split_top_level(text, ',')
        .into_iter()
        .map(|item| {
            let split = find_top_level(item, ":=")?;
            let expression = item[split + 2..].trim();
            if expression.is_empty() {
                return None;
            }
            let tokens: Vec<&str> = item[..split].split_whitespace().collect();
            let (role, target) = match tokens.as_slice() {
                [target] => (Role::Measure, *target),
                [role, target] => (parse_role(role)?, *target),
                _ => return None,
            };
            IDENTIFIER_REGEX.is_match(target).then(|| CalcItem {
                role,
                target: target.to_string(),
                expression: expression.to_string(),
            })
        })
        .collect()
}

fn parse_role(text: &str) -> Option<Role> {
    match text.to_ascii_lowercase().as_str() {
        "identifier" => Some(Role::Identifier),
        "measure" | "attribute" => Some(Role::Measure),
        _ => None,
    }
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Splits on `separator` outside brackets, parentheses and string literals.
pub(crate) fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (index, c) in text.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth = depth.saturating_sub(1),
            c if c == separator && !in_string && depth == 0 => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Byte offset of the first `pattern` outside brackets and string literals.
fn find_top_level(text: &str, pattern: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (index, c) in text.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth = depth.saturating_sub(1),
            _ if !in_string && depth == 0 && text[index..].starts_with(pattern) => {
                return Some(index);
            }
            _ => {}
        }
    }
    None
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Assign { target, value } => write!(f, "{target} := {value};"),
            Statement::Script(text) => write!(f, "{text}"),
        }
    }
}

impl fmt::Display for DatasetExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetExpr::Operand(operand) => write!(f, "{operand}"),
            DatasetExpr::Union(operands) => {
                let operands: Vec<String> = operands.iter().map(ToString::to_string).collect();
                write!(f, "union({})", operands.join(", "))
            }
            DatasetExpr::LeftJoin(left, right) => write!(f, "left_join({left}, {right})"),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.clause {
            Some(clause) => write!(f, "{} [{clause}]", self.dataset),
            None => write!(f, "{}", self.dataset),
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::Keep(columns) => write!(f, "keep {}", columns.join(", ")),
            Clause::Drop(columns) => write!(f, "drop {}", columns.join(", ")),
            Clause::Rename(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(from, to)| format!("{from} to {to}"))
                    .collect();
                write!(f, "rename {}", pairs.join(", "))
            }
            Clause::Filter(condition) => write!(f, "filter {condition}"),
            Clause::Calc(items) => {
                let items: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "calc {}", items.join(", "))
            }
        }
    }
}

impl fmt::Display for CalcItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Role::Identifier => write!(f, "identifier {} := {}", self.target, self.expression),
            Role::Measure => write!(f, "{} := {}", self.target, self.expression),
        }
    }
}
