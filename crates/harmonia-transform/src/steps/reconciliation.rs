use harmonia_model::constants::{KEEP_SUFFIX, MODE_VARIABLE_NAME};
use tracing::{debug, info};

use super::{InstructionGenerator, quote};
use crate::bindings::{Bindings, Dataset};
use crate::error::{Result, TransformError};
use crate::statement::{Operand, Statement};

/// Merges the per-mode datasets into one reconciled dataset.
///
/// With several modes:
/// 1. every mode gets a `MODE` identifier holding its name
/// 2. measures present in every mode are stacked with `union`; integer
///    columns among them are cast to number first
/// 3. measures specific to a mode are projected into `<mode>_keep` and
///    left-joined back onto the stacked rows; a measure shared by several
///    but not all modes is joined once and filled from the later modes
///
/// A single mode is aliased unchanged and no mode at all is a no-op.
pub struct ReconciliationStep {
    modes: Vec<String>,
}

impl ReconciliationStep {
    pub fn new<I, S>(modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modes: modes.into_iter().map(Into::into).collect(),
        }
    }

    fn mode_datasets<'b>(&self, bindings: &'b Bindings) -> Result<Vec<(&str, &'b Dataset)>> {
        self.modes
            .iter()
            .map(|mode| {
                bindings
                    .get(mode)
                    .map(|dataset| (mode.as_str(), dataset))
                    .ok_or_else(|| TransformError::MissingBinding(mode.clone()))
            })
            .collect()
    }
}

impl InstructionGenerator for ReconciliationStep {
    fn step_name(&self) -> &str {
        "reconciliation"
    }

    fn generate(&mut self, binding_name: &str, bindings: &mut Bindings) -> Result<Vec<Statement>> {
        match self.modes.as_slice() {
            [] => {
                info!("no mode to reconcile");
                return Ok(Vec::new());
            }
            [single] => return Ok(vec![Statement::alias(binding_name, single.as_str())]),
            _ => {}
        }

        let datasets = self.mode_datasets(bindings)?;
        let mut statements = Vec::new();

        for (mode, _) in &datasets {
            statements.push(Statement::calc_identifier(
                mode,
                MODE_VARIABLE_NAME,
                quote(mode),
            ));
        }

        let mut identifiers: Vec<String> = Vec::new();
        for (_, dataset) in &datasets {
            for id in dataset.identifier_names() {
                if id != MODE_VARIABLE_NAME && !identifiers.contains(&id) {
                    identifiers.push(id);
                }
            }
        }

        let (_, first) = datasets[0];
        let mut common: Vec<String> = first
            .measure_names()
            .into_iter()
            .filter(|name| name != MODE_VARIABLE_NAME)
            .filter(|name| {
                datasets[1..]
                    .iter()
                    .all(|(_, dataset)| dataset.measure_names().contains(name))
            })
            .collect();
        debug!(identifiers = ?identifiers, common = ?common, "reconciliation columns");

        for (mode, dataset) in &datasets {
            for column in &common {
                if dataset.is_integer_column(column) {
                    statements.push(Statement::calc(
                        mode,
                        column.as_str(),
                        format!("cast({column}, number)"),
                    ));
                }
            }
        }
        common.push(MODE_VARIABLE_NAME.to_string());

        let stacked_columns = |dataset: &Dataset| -> Vec<String> {
            identifiers
                .iter()
                .filter(|id| dataset.has_column(id))
                .chain(common.iter())
                .cloned()
                .collect()
        };

        let (first_mode, first) = datasets[0];
        statements.push(Statement::keep(
            binding_name,
            first_mode,
            stacked_columns(first),
        ));
        for (mode, dataset) in &datasets[1..] {
            statements.push(Statement::union(
                binding_name,
                vec![
                    Operand::new(binding_name),
                    Operand::keep(*mode, stacked_columns(*dataset)),
                ],
            ));
        }

        let mut joined: Vec<String> = Vec::new();
        for (mode, dataset) in &datasets {
            let specific: Vec<String> = dataset
                .column_names()
                .into_iter()
                .filter(|name| !common.contains(name) && !identifiers.contains(name))
                .collect();
            if specific.is_empty() {
                continue;
            }
            let (shared, fresh): (Vec<String>, Vec<String>) = specific
                .into_iter()
                .partition(|column| joined.contains(column));
            let keep_name = format!("{mode}{KEEP_SUFFIX}");
            let columns: Vec<String> = identifiers
                .iter()
                .filter(|id| dataset.has_column(id))
                .cloned()
                .chain(std::iter::once(MODE_VARIABLE_NAME.to_string()))
                .chain(fresh.iter().cloned())
                .chain(shared.iter().cloned())
                .collect();
            statements.push(Statement::keep(keep_name.as_str(), *mode, columns));

            // Columns already brought in by an earlier mode are joined under
            // a staged name, then folded into the existing column.
            let staged: Vec<(String, String)> = shared
                .iter()
                .map(|column| (column.clone(), format!("{keep_name}.{column}")))
                .collect();
            if !staged.is_empty() {
                statements.push(Statement::rename_all(&keep_name, staged.clone()));
            }
            statements.push(Statement::left_join(
                binding_name,
                Operand::new(binding_name),
                Operand::new(keep_name.as_str()),
            ));
            for (column, staged_name) in &staged {
                statements.push(Statement::calc(
                    binding_name,
                    column.as_str(),
                    format!("nvl({column}, {staged_name})"),
                ));
            }
            if !staged.is_empty() {
                statements.push(Statement::drop_columns(
                    binding_name,
                    staged.into_iter().map(|(_, staged_name)| staged_name),
                ));
            }
            joined.extend(fresh);
        }

        statements.push(Statement::calc_identifier(
            binding_name,
            MODE_VARIABLE_NAME,
            MODE_VARIABLE_NAME,
        ));
        Ok(statements)
    }
}
