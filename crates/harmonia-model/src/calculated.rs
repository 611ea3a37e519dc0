use serde::{Deserialize, Serialize};

/// A variable derived from an expression over other variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculatedVariable {
    pub name: String,
    /// Opaque expression text for the execution engine.
    #[serde(default)]
    pub expression: String,
    /// Variables that must be available before this one is evaluated.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl CalculatedVariable {
    pub fn new(name: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }
}

/// Name-keyed collection that preserves insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculatedVariables {
    entries: Vec<CalculatedVariable>,
}

impl CalculatedVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces in place.
    pub fn put(&mut self, variable: CalculatedVariable) {
        if let Some(existing) = self.entries.iter_mut().find(|v| v.name == variable.name) {
            *existing = variable;
        } else {
            self.entries.push(variable);
        }
    }

    pub fn get(&self, name: &str) -> Option<&CalculatedVariable> {
        self.entries.iter().find(|v| v.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CalculatedVariable> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<CalculatedVariable> for CalculatedVariables {
    fn from_iter<T: IntoIterator<Item = CalculatedVariable>>(iter: T) -> Self {
        let mut collection = CalculatedVariables::new();
        for variable in iter {
            collection.put(variable);
        }
        collection
    }
}
