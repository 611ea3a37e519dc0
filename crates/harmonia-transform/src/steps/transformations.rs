use super::InstructionGenerator;
use crate::bindings::Bindings;
use crate::error::Result;
use crate::statement::Statement;

/// Free-form transformations on the reconciled dataset. Everything comes
/// from the user script.
#[derive(Debug, Default)]
pub struct TransformationsStep;

impl InstructionGenerator for TransformationsStep {
    fn step_name(&self) -> &str {
        "transformations"
    }

    fn generate(&mut self, _binding_name: &str, _bindings: &mut Bindings) -> Result<Vec<Statement>> {
        Ok(Vec::new())
    }
}
