//! Polars-backed execution of harmonia statements.
//!
//! [`PolarsEngine`] evaluates each statement eagerly against the bindings;
//! scalar expressions inside `calc` and `filter` clauses are translated by
//! [`parse_expression`].

pub mod error;
pub mod executor;
pub mod expr;
pub mod frame;

pub use error::{EngineError, Result};
pub use executor::PolarsEngine;
pub use expr::parse_expression;
pub use frame::{any_to_string, column_value_string, distinct_rows};
