//! Instruction generators, one per processing step.
//!
//! # Run order
//!
//! Per mode:
//! 1. **GroupPrefixStep** - rename group variables to fully qualified names
//! 2. **CalculatedStep** / **PaperUcqStep** - format-specific derivations
//!
//! On the reconciled dataset:
//! 3. **ReconciliationStep** - merge every mode into one dataset
//! 4. **CleanUpStep** - drop paper indicators and per-mode bindings
//! 5. **TransformationsStep** - user statements only
//! 6. **InformationLevelsStep** - split into one dataset per group

mod calculated;
mod clean_up;
mod group_prefix;
mod information_levels;
mod paper_ucq;
mod reconciliation;
mod transformations;

pub use calculated::CalculatedStep;
pub use clean_up::CleanUpStep;
pub use group_prefix::GroupPrefixStep;
pub use information_levels::InformationLevelsStep;
pub use paper_ucq::PaperUcqStep;
pub use reconciliation::ReconciliationStep;
pub use transformations::TransformationsStep;

use crate::bindings::Bindings;
use crate::error::Result;
use crate::statement::Statement;

/// Produces the automated statements of a processing step.
pub trait InstructionGenerator {
    /// Human-readable name for logging and reports.
    fn step_name(&self) -> &str;

    /// Statements for `binding_name`, in execution order.
    ///
    /// Generators may read the bindings to adapt to the columns present, and
    /// may remove bindings they own.
    fn generate(&mut self, binding_name: &str, bindings: &mut Bindings) -> Result<Vec<Statement>>;
}

/// String literal for generated expressions; inner quotes are doubled.
pub(crate) fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}
