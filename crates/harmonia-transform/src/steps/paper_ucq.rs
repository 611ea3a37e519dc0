use harmonia_model::{MetadataModel, VariableKind};

use super::{InstructionGenerator, quote};
use crate::bindings::Bindings;
use crate::error::Result;
use crate::statement::Statement;

/// Recodes paper single-choice questions from their per-modality indicators.
///
/// For a question `Q` with indicators `Q_1` (value "1") and `Q_2` (value "2"):
///
/// ```text
/// Q := if Q_1 = "1" then "1" else if Q_2 = "1" then "2" else ""
/// ```
pub struct PaperUcqStep<'a> {
    metadata: &'a MetadataModel,
}

impl<'a> PaperUcqStep<'a> {
    pub fn new(metadata: &'a MetadataModel) -> Self {
        Self { metadata }
    }

    fn recode_expression(&self, ucq_name: &str) -> Option<String> {
        let mut expression = String::new();
        let mut branches = 0;
        for indicator in self.metadata.paper_indicators(ucq_name) {
            let VariableKind::PaperUcq { modality_value, .. } = &indicator.kind else {
                continue;
            };
            let column = self
                .metadata
                .fully_qualified_name(&indicator.name)
                .unwrap_or_else(|| indicator.name.clone());
            expression.push_str(&format!(
                "if {column} = \"1\" then {} else ",
                quote(modality_value)
            ));
            branches += 1;
        }
        if branches == 0 {
            return None;
        }
        expression.push_str("\"\"");
        Some(expression)
    }
}

impl InstructionGenerator for PaperUcqStep<'_> {
    fn step_name(&self) -> &str {
        "paper single-choice recoding"
    }

    fn generate(&mut self, binding_name: &str, _bindings: &mut Bindings) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        for variable in self.metadata.variables().iter() {
            if !matches!(variable.kind, VariableKind::Ucq { .. }) {
                continue;
            }
            let Some(expression) = self.recode_expression(&variable.name) else {
                continue;
            };
            let target = self
                .metadata
                .fully_qualified_name(&variable.name)
                .unwrap_or_else(|| variable.name.clone());
            statements.push(Statement::calc(binding_name, target, expression));
        }
        Ok(statements)
    }
}
