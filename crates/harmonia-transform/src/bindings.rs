//! Named datasets shared by every stage of a run.

use std::collections::BTreeMap;

use polars::prelude::{DataFrame, DataType};
use serde::{Deserialize, Serialize};

/// Role of a dataset column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Identifier,
    Measure,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Identifier => "identifier",
            Role::Measure => "measure",
        }
    }
}

/// A data frame plus the set of columns playing the identifier role.
///
/// Columns not listed as identifiers are measures. Identifiers that are not
/// columns of the frame are dropped whenever the frame changes.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    data: DataFrame,
    identifiers: Vec<String>,
}

impl Dataset {
    pub fn new<I, S>(data: DataFrame, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dataset = Self {
            data,
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        };
        dataset.retain_present_identifiers();
        dataset
    }

    pub fn data(&self) -> &DataFrame {
        &self.data
    }

    pub fn into_data(self) -> DataFrame {
        self.data
    }

    /// Replaces the frame, keeping the identifier roles of surviving columns.
    pub fn set_data(&mut self, data: DataFrame) {
        self.data = data;
        self.retain_present_identifiers();
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.get_column_index(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Identifier columns in frame order.
    pub fn identifier_names(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| self.identifiers.contains(name))
            .collect()
    }

    /// Measure columns in frame order.
    pub fn measure_names(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| !self.identifiers.contains(name))
            .collect()
    }

    pub fn role(&self, column: &str) -> Option<Role> {
        if !self.has_column(column) {
            return None;
        }
        if self.identifiers.iter().any(|id| id == column) {
            Some(Role::Identifier)
        } else {
            Some(Role::Measure)
        }
    }

    pub fn set_role(&mut self, column: &str, role: Role) {
        match role {
            Role::Identifier => {
                if !self.identifiers.iter().any(|id| id == column) {
                    self.identifiers.push(column.to_string());
                }
            }
            Role::Measure => self.identifiers.retain(|id| id != column),
        }
        self.retain_present_identifiers();
    }

    pub fn column_type(&self, column: &str) -> Option<&DataType> {
        self.data.column(column).ok().map(|c| c.dtype())
    }

    pub fn is_integer_column(&self, column: &str) -> bool {
        self.column_type(column).is_some_and(DataType::is_integer)
    }

    fn retain_present_identifiers(&mut self) {
        let columns = self.column_names();
        let mut seen = Vec::with_capacity(self.identifiers.len());
        self.identifiers.retain(|id| {
            if columns.contains(id) && !seen.contains(id) {
                seen.push(id.clone());
                true
            } else {
                false
            }
        });
    }
}

/// Name to dataset map. Names are unique; iteration is ordered by name.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    datasets: BTreeMap<String, Dataset>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, returning the dataset it replaced.
    pub fn insert(&mut self, name: impl Into<String>, dataset: Dataset) -> Option<Dataset> {
        self.datasets.insert(name.into(), dataset)
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Dataset> {
        self.datasets.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Dataset> {
        self.datasets.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.datasets.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Dataset)> {
        self.datasets.iter()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}
