//! Statement execution on polars data frames.

use harmonia_transform::{
    Bindings, CalcItem, Clause, Dataset, DatasetExpr, ExecutionEngine, Issue, Operand, Statement,
};
use polars::prelude::{
    IntoLazy, JoinArgs, JoinType, SortMultipleOptions, UnionArgs, col, concat_lf_diagonal,
};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::expr::parse_expression;
use crate::frame::distinct_rows;

const ROW_INDEX: &str = "__row_index";

/// Executes statements eagerly, one frame at a time.
///
/// - `union` stacks operands by column name, filling missing columns with
///   nulls, then keeps distinct rows
/// - `left_join` matches on the identifiers both sides share and keeps the
///   left row order
/// - `keep`, `drop` and `rename` carry identifier roles along
#[derive(Debug, Default, Clone, Copy)]
pub struct PolarsEngine;

impl PolarsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Executes a single statement, binding its result.
    pub fn execute_statement(&self, statement: &Statement, bindings: &mut Bindings) -> Result<()> {
        match statement {
            Statement::Script(text) => Err(EngineError::Unsupported(text.clone())),
            Statement::Assign { target, value } => {
                let dataset = evaluate(value, bindings)?;
                debug!(
                    target = %target,
                    rows = dataset.height(),
                    columns = dataset.width(),
                    "bound"
                );
                bindings.insert(target.clone(), dataset);
                Ok(())
            }
        }
    }
}

impl ExecutionEngine for PolarsEngine {
    fn execute(
        &self,
        statements: &[Statement],
        bindings: &mut Bindings,
        issues: &mut Vec<Issue>,
    ) -> harmonia_transform::Result<()> {
        for statement in statements {
            if let Err(error) = self.execute_statement(statement, bindings) {
                warn!(%statement, %error, "statement failed");
                issues.push(Issue::execution(statement, error.to_string()));
            }
        }
        Ok(())
    }
}

fn evaluate(value: &DatasetExpr, bindings: &Bindings) -> Result<Dataset> {
    match value {
        DatasetExpr::Operand(operand) => evaluate_operand(operand, bindings),
        DatasetExpr::Union(operands) => {
            let datasets = operands
                .iter()
                .map(|operand| evaluate_operand(operand, bindings))
                .collect::<Result<Vec<_>>>()?;
            union(&datasets)
        }
        DatasetExpr::LeftJoin(left, right) => left_join(
            &evaluate_operand(left, bindings)?,
            &evaluate_operand(right, bindings)?,
        ),
    }
}

fn evaluate_operand(operand: &Operand, bindings: &Bindings) -> Result<Dataset> {
    let dataset = bindings
        .get(&operand.dataset)
        .ok_or_else(|| EngineError::UnknownDataset(operand.dataset.clone()))?;
    match &operand.clause {
        None => Ok(dataset.clone()),
        Some(clause) => apply_clause(&operand.dataset, dataset, clause),
    }
}

fn require_columns(name: &str, dataset: &Dataset, columns: &[String]) -> Result<()> {
    match columns.iter().find(|column| !dataset.has_column(column)) {
        Some(missing) => Err(EngineError::UnknownColumn {
            dataset: name.to_string(),
            column: missing.clone(),
        }),
        None => Ok(()),
    }
}

fn apply_clause(name: &str, dataset: &Dataset, clause: &Clause) -> Result<Dataset> {
    let identifiers = dataset.identifier_names();
    match clause {
        Clause::Keep(columns) => {
            require_columns(name, dataset, columns)?;
            let data = dataset.data().select(columns.iter().cloned())?;
            Ok(Dataset::new(data, identifiers))
        }
        Clause::Drop(columns) => {
            require_columns(name, dataset, columns)?;
            let mut data = dataset.data().clone();
            for column in columns {
                data = data.drop(column)?;
            }
            Ok(Dataset::new(data, identifiers))
        }
        Clause::Rename(pairs) => {
            let from: Vec<String> = pairs.iter().map(|(from, _)| from.clone()).collect();
            require_columns(name, dataset, &from)?;
            let mut data = dataset.data().clone();
            let mut identifiers = identifiers;
            for (from, to) in pairs {
                if from != to && data.get_column_index(to).is_some() {
                    return Err(EngineError::DuplicateColumn(to.clone()));
                }
                data.rename(from, to.as_str().into())?;
                for id in &mut identifiers {
                    if id == from {
                        id.clone_from(to);
                    }
                }
            }
            Ok(Dataset::new(data, identifiers))
        }
        Clause::Filter(condition) => {
            let predicate = parse_expression(condition)?;
            let data = dataset.data().clone().lazy().filter(predicate).collect()?;
            Ok(Dataset::new(data, identifiers))
        }
        Clause::Calc(items) => calc(dataset, items),
    }
}

fn calc(dataset: &Dataset, items: &[CalcItem]) -> Result<Dataset> {
    let exprs = items
        .iter()
        .map(|item| Ok(parse_expression(&item.expression)?.alias(item.target.as_str())))
        .collect::<Result<Vec<_>>>()?;
    let data = dataset.data().clone().lazy().with_columns(exprs).collect()?;
    let mut result = Dataset::new(data, dataset.identifier_names());
    for item in items {
        result.set_role(&item.target, item.role);
    }
    Ok(result)
}

fn union(datasets: &[Dataset]) -> Result<Dataset> {
    let frames = datasets
        .iter()
        .map(|dataset| dataset.data().clone().lazy())
        .collect::<Vec<_>>();
    let args = UnionArgs {
        to_supertypes: true,
        ..Default::default()
    };
    let stacked = concat_lf_diagonal(frames, args)?.collect()?;
    let identifiers: Vec<String> = datasets
        .iter()
        .flat_map(Dataset::identifier_names)
        .collect();
    Ok(Dataset::new(distinct_rows(&stacked)?, identifiers))
}

fn left_join(left: &Dataset, right: &Dataset) -> Result<Dataset> {
    let right_identifiers = right.identifier_names();
    let keys: Vec<String> = left
        .identifier_names()
        .into_iter()
        .filter(|id| right_identifiers.contains(id))
        .collect();
    if keys.is_empty() {
        return Err(EngineError::NoJoinKeys);
    }
    if let Some(duplicate) = right
        .column_names()
        .into_iter()
        .find(|column| !keys.contains(column) && left.has_column(column))
    {
        return Err(EngineError::DuplicateColumn(duplicate));
    }

    let on: Vec<_> = keys.iter().map(|key| col(key.as_str())).collect();
    let joined = left
        .data()
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .join(
            right.data().clone().lazy(),
            on.clone(),
            on,
            JoinArgs::new(JoinType::Left),
        )
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;
    Ok(Dataset::new(joined, left.identifier_names()))
}
