use std::collections::BTreeMap;

use harmonia_model::MetadataModel;
use harmonia_model::constants::KEEP_SUFFIX;
use tracing::debug;

use super::InstructionGenerator;
use crate::bindings::Bindings;
use crate::error::Result;
use crate::statement::Statement;

/// Drops paper indicator columns and releases per-mode bindings.
///
/// Besides the generated drop, the step removes the paper indicator
/// variables from every mode's metadata and unbinds each mode dataset along
/// with its `<mode>_keep` projection.
pub struct CleanUpStep<'a> {
    modes: Vec<String>,
    metadata: &'a mut BTreeMap<String, MetadataModel>,
}

impl<'a> CleanUpStep<'a> {
    pub fn new<I, S>(modes: I, metadata: &'a mut BTreeMap<String, MetadataModel>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            modes: modes.into_iter().map(Into::into).collect(),
            metadata,
        }
    }
}

impl InstructionGenerator for CleanUpStep<'_> {
    fn step_name(&self) -> &str {
        "clean up"
    }

    fn generate(&mut self, binding_name: &str, bindings: &mut Bindings) -> Result<Vec<Statement>> {
        let mut columns: Vec<String> = Vec::new();
        for model in self.metadata.values() {
            for name in model.paper_ucq_names() {
                let qualified = model.fully_qualified_name(&name).unwrap_or(name);
                if !columns.contains(&qualified) {
                    columns.push(qualified);
                }
            }
        }
        if let Some(dataset) = bindings.get(binding_name) {
            columns.retain(|column| dataset.has_column(column));
        }

        let statements = if columns.is_empty() {
            Vec::new()
        } else {
            vec![Statement::drop_columns(binding_name, columns)]
        };

        for model in self.metadata.values_mut() {
            for name in model.paper_ucq_names() {
                model.remove_variable(&name);
            }
        }

        for mode in &self.modes {
            if mode != binding_name && bindings.remove(mode).is_some() {
                debug!(binding = %mode, "mode binding released");
            }
            bindings.remove(&format!("{mode}{KEEP_SUFFIX}"));
        }
        Ok(statements)
    }
}
