//! Recoverable problems collected during a run.
//!
//! Issues never abort the pipeline; they are accumulated in the pipeline
//! context and surfaced to the caller once the run completes.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IssueSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    /// A generated or user statement failed in the execution engine.
    Execution { statement: String, message: String },
    /// A user script could not be read.
    UserScript { path: PathBuf, message: String },
    /// Observed values exceed the declared length of a variable.
    VariableLength {
        dataset: String,
        variable: String,
        declared: u32,
        observed: usize,
    },
}

impl Issue {
    pub fn execution(statement: impl fmt::Display, message: impl Into<String>) -> Self {
        Issue::Execution {
            statement: statement.to_string(),
            message: message.into(),
        }
    }

    pub fn severity(&self) -> IssueSeverity {
        match self {
            Issue::Execution { .. } | Issue::UserScript { .. } => IssueSeverity::Error,
            Issue::VariableLength { .. } => IssueSeverity::Warning,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::Execution { statement, message } => {
                write!(f, "statement failed: {statement} ({message})")
            }
            Issue::UserScript { path, message } => {
                write!(f, "user script {} unreadable: {message}", path.display())
            }
            Issue::VariableLength {
                dataset,
                variable,
                declared,
                observed,
            } => write!(
                f,
                "{dataset}.{variable}: observed length {observed} exceeds declared length {declared}"
            ),
        }
    }
}
