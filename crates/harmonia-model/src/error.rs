use thiserror::Error;

/// Structural problems in a metadata model. These abort a run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("metadata model has no root group")]
    MissingRootGroup,
    #[error("metadata model has {count} root groups, expected exactly one")]
    MultipleRootGroups { count: usize },
    #[error("group '{group}' references unknown parent group '{parent}'")]
    UnknownParentGroup { group: String, parent: String },
    #[error("group '{group}' is part of a cycle in the group tree")]
    GroupCycle { group: String },
    #[error("variable '{variable}' belongs to unknown group '{group}'")]
    UnknownGroup { variable: String, group: String },
    #[error("unknown variable type '{0}'")]
    UnknownVariableType(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
