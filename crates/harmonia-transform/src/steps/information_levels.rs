use harmonia_model::MetadataModel;
use harmonia_model::constants::{MODE_VARIABLE_NAME, ROOT_IDENTIFIER_NAME};
use tracing::debug;

use super::InstructionGenerator;
use crate::bindings::{Bindings, Dataset};
use crate::error::{Result, TransformError};
use crate::statement::{Operand, Statement};

/// Splits the reconciled dataset into one dataset per group.
///
/// The root group dataset keeps one row per survey unit with the root
/// variables. Each sub-group dataset keeps the rows where the group
/// identifier is set, with the group variables under their bare names.
/// Groups nested below a sub-group are split with their own identifier only,
/// not with the identifiers of their ancestors.
pub struct InformationLevelsStep<'a> {
    metadata: &'a MetadataModel,
}

impl<'a> InformationLevelsStep<'a> {
    pub fn new(metadata: &'a MetadataModel) -> Self {
        Self { metadata }
    }
}

fn present(dataset: &Dataset, columns: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for column in columns {
        if dataset.has_column(&column) && !kept.contains(&column) {
            kept.push(column);
        } else if !dataset.has_column(&column) {
            debug!(column = %column, "column absent from reconciled dataset");
        }
    }
    kept
}

fn deduplicate(dataset_name: &str) -> Statement {
    Statement::union(
        dataset_name,
        vec![Operand::new(dataset_name), Operand::new(dataset_name)],
    )
}

impl InstructionGenerator for InformationLevelsStep<'_> {
    fn step_name(&self) -> &str {
        "information levels"
    }

    fn generate(&mut self, binding_name: &str, bindings: &mut Bindings) -> Result<Vec<Statement>> {
        let dataset = bindings
            .get(binding_name)
            .ok_or_else(|| TransformError::MissingBinding(binding_name.to_string()))?;
        let root = self.metadata.root_group()?.name.clone();
        let identifiers = self.metadata.identifier_names();
        let mut statements = Vec::new();

        let root_columns = present(
            dataset,
            std::iter::once(ROOT_IDENTIFIER_NAME.to_string())
                .chain(
                    self.metadata
                        .variables_in_group(&root)
                        .map(|variable| variable.name.clone())
                        .filter(|name| !identifiers.contains(name) && name != MODE_VARIABLE_NAME),
                )
                .chain(std::iter::once(MODE_VARIABLE_NAME.to_string())),
        );
        statements.push(Statement::keep(root.as_str(), binding_name, root_columns));
        statements.push(deduplicate(&root));

        for group in self.metadata.sub_group_names() {
            if !dataset.has_column(&group) {
                debug!(group = %group, "group identifier absent, level skipped");
                continue;
            }
            let members: Vec<(String, String)> = self
                .metadata
                .variables_in_group(&group)
                .filter_map(|variable| {
                    let qualified = self.metadata.fully_qualified_name(&variable.name)?;
                    dataset
                        .has_column(&qualified)
                        .then(|| (qualified, variable.name.clone()))
                })
                .collect();
            let columns = present(
                dataset,
                [ROOT_IDENTIFIER_NAME.to_string(), group.clone()]
                    .into_iter()
                    .chain(members.iter().map(|(qualified, _)| qualified.clone()))
                    .chain(std::iter::once(MODE_VARIABLE_NAME.to_string())),
            );
            statements.push(Statement::keep(group.as_str(), binding_name, columns));
            statements.push(Statement::filter(&group, format!("{group} <> \"\"")));
            statements.push(deduplicate(&group));

            let renames: Vec<(String, String)> = members
                .into_iter()
                .filter(|(qualified, bare)| qualified != bare)
                .collect();
            if !renames.is_empty() {
                statements.push(Statement::rename_all(&group, renames));
            }
        }
        Ok(statements)
    }
}
