//! Survey metadata model.
//!
//! - **group**: repeated-row contexts forming a tree under the root group
//! - **variable**: collected variables and their question kinds
//! - **metadata**: per-mode registry with fully qualified naming
//! - **calculated**: variables derived from expressions

pub mod calculated;
pub mod constants;
pub mod error;
pub mod group;
pub mod metadata;
pub mod variable;

pub use calculated::{CalculatedVariable, CalculatedVariables};
pub use error::{ModelError, Result};
pub use group::Group;
pub use metadata::{MetadataModel, VariableRegistry};
pub use variable::{Modality, Variable, VariableKind, VariableType};
