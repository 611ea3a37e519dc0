use harmonia_model::{CalculatedVariables, MetadataModel};
use tracing::debug;

use super::InstructionGenerator;
use crate::bindings::Bindings;
use crate::error::Result;
use crate::resolver::resolve;
use crate::statement::Statement;

/// Evaluates calculated variables in dependency order.
///
/// A variable registered in the mode metadata is written under its fully
/// qualified name; otherwise under its bare name.
pub struct CalculatedStep<'a> {
    metadata: &'a MetadataModel,
    calculated: &'a CalculatedVariables,
}

impl<'a> CalculatedStep<'a> {
    pub fn new(metadata: &'a MetadataModel, calculated: &'a CalculatedVariables) -> Self {
        Self {
            metadata,
            calculated,
        }
    }
}

impl InstructionGenerator for CalculatedStep<'_> {
    fn step_name(&self) -> &str {
        "calculated variables"
    }

    fn generate(&mut self, binding_name: &str, _bindings: &mut Bindings) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        for name in resolve(self.calculated) {
            let Some(variable) = self.calculated.get(&name) else {
                continue;
            };
            if variable.expression.trim().is_empty() {
                debug!(variable = %name, "calculated variable without expression skipped");
                continue;
            }
            let target = self.metadata.fully_qualified_name(&name).unwrap_or(name);
            statements.push(Statement::calc(
                binding_name,
                target,
                variable.expression.trim(),
            ));
        }
        Ok(statements)
    }
}
