use crate::bindings::Bindings;
use crate::error::Result;
use crate::issue::Issue;
use crate::statement::Statement;

/// Evaluates statements against the bindings.
///
/// Statements are executed in order. A failing statement is recorded as an
/// [`Issue`] and execution continues with the next one; `Err` is reserved
/// for failures that leave the bindings unusable.
pub trait ExecutionEngine {
    fn execute(
        &self,
        statements: &[Statement],
        bindings: &mut Bindings,
        issues: &mut Vec<Issue>,
    ) -> Result<()>;
}
