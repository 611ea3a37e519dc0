use std::collections::BTreeSet;

use harmonia_model::MetadataModel;
use tracing::warn;

use super::InstructionGenerator;
use crate::bindings::Bindings;
use crate::error::Result;
use crate::statement::Statement;

/// Renames every non-root variable to its fully qualified name.
pub struct GroupPrefixStep<'a> {
    metadata: &'a MetadataModel,
}

impl<'a> GroupPrefixStep<'a> {
    pub fn new(metadata: &'a MetadataModel) -> Self {
        Self { metadata }
    }
}

impl InstructionGenerator for GroupPrefixStep<'_> {
    fn step_name(&self) -> &str {
        "group prefixes"
    }

    fn generate(&mut self, binding_name: &str, _bindings: &mut Bindings) -> Result<Vec<Statement>> {
        let mut targets = BTreeSet::new();
        let mut statements = Vec::new();
        for variable in self.metadata.variables().iter() {
            if self.metadata.is_in_root_group(&variable.name) {
                continue;
            }
            let Some(qualified) = self.metadata.fully_qualified_name(&variable.name) else {
                continue;
            };
            if qualified == variable.name {
                continue;
            }
            if !targets.insert(qualified.clone()) {
                warn!(
                    variable = %variable.name,
                    target = %qualified,
                    "rename target already used, variable left unprefixed"
                );
                continue;
            }
            statements.push(Statement::rename(binding_name, &variable.name, qualified));
        }
        Ok(statements)
    }
}
