use serde::{Deserialize, Serialize};

use crate::constants::ROOT_GROUP_NAME;

/// A repeated-row context. Groups form a tree; the root has no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, parent_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_name: Some(parent_name.into()),
        }
    }

    /// The root group every model starts with.
    pub fn root() -> Self {
        Self {
            name: ROOT_GROUP_NAME.to_string(),
            parent_name: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_name.is_none()
    }
}
