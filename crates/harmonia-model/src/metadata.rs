//! Variable and group registry for one collection mode.
//!
//! A [`MetadataModel`] owns a tree of [`Group`]s rooted at
//! [`ROOT_GROUP_NAME`] and an insertion-ordered registry of [`Variable`]s.
//! It derives fully qualified names, which prefix a variable with the chain of
//! its ancestor groups (root excluded) so that identically named variables in
//! different loops stay distinct once datasets are merged.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{METADATA_SEPARATOR, ROOT_GROUP_NAME, ROOT_IDENTIFIER_NAME};
use crate::error::{ModelError, Result};
use crate::group::Group;
use crate::variable::{Variable, VariableKind};

/// Insertion-ordered variable registry keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Variable>", into = "Vec<Variable>")]
pub struct VariableRegistry {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl VariableRegistry {
    /// Inserts or replaces; a replaced variable keeps its position.
    pub fn insert(&mut self, variable: Variable) {
        if let Some(&position) = self.index.get(&variable.name) {
            self.variables[position] = variable;
            return;
        }
        self.index
            .insert(variable.name.clone(), self.variables.len());
        self.variables.push(variable);
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&position| &self.variables[position])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let position = *self.index.get(name)?;
        self.variables.get_mut(position)
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let position = self.index.remove(name)?;
        let removed = self.variables.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl From<Vec<Variable>> for VariableRegistry {
    fn from(variables: Vec<Variable>) -> Self {
        let mut registry = VariableRegistry::default();
        for variable in variables {
            registry.insert(variable);
        }
        registry
    }
}

impl From<VariableRegistry> for Vec<Variable> {
    fn from(registry: VariableRegistry) -> Self {
        registry.variables
    }
}

/// Groups and variables describing one collection mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataModel {
    groups: Vec<Group>,
    variables: VariableRegistry,
}

impl Default for MetadataModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataModel {
    /// Creates a model holding only the root group.
    pub fn new() -> Self {
        Self {
            groups: vec![Group::root()],
            variables: VariableRegistry::default(),
        }
    }

    /// Registers a group, replacing any group with the same name.
    pub fn put_group(&mut self, group: Group) {
        if let Some(existing) = self.groups.iter_mut().find(|g| g.name == group.name) {
            *existing = group;
        } else {
            self.groups.push(group);
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn root_group(&self) -> Result<&Group> {
        self.groups
            .iter()
            .find(|group| group.is_root())
            .ok_or(ModelError::MissingRootGroup)
    }

    /// Names of every non-root group, in registration order.
    pub fn sub_group_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|group| !group.is_root())
            .map(|group| group.name.clone())
            .collect()
    }

    /// Identifier columns: the survey-unit identifier plus one per subgroup.
    pub fn identifier_names(&self) -> Vec<String> {
        let mut names = vec![ROOT_IDENTIFIER_NAME.to_string()];
        names.extend(self.sub_group_names());
        names
    }

    /// Registers a variable. Variables without a name are ignored.
    pub fn put_variable(&mut self, variable: Variable) {
        if variable.name.trim().is_empty() {
            debug!("ignoring variable without a name");
            return;
        }
        self.variables.insert(variable);
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(name)
    }

    pub fn variables(&self) -> &VariableRegistry {
        &self.variables
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    /// Variables owned directly by `group_name`, in registry order.
    pub fn variables_in_group<'a>(
        &'a self,
        group_name: &'a str,
    ) -> impl Iterator<Item = &'a Variable> + 'a {
        self.variables
            .iter()
            .filter(move |variable| variable.group_name == group_name)
    }

    /// Whether the variable belongs to the root group (or to no known group).
    pub fn is_in_root_group(&self, name: &str) -> bool {
        self.variable(name)
            .and_then(|variable| self.group(&variable.group_name))
            .is_none_or(Group::is_root)
    }

    /// Variable name prefixed by its ancestor groups, root excluded.
    ///
    /// `G1.G2.NAME` for a variable of `G2` whose parent is `G1`; a root-group
    /// variable keeps its bare name. Returns `None` for unregistered names.
    pub fn fully_qualified_name(&self, name: &str) -> Option<String> {
        let Some(variable) = self.variable(name) else {
            debug!(variable = name, "no fully qualified name for unknown variable");
            return None;
        };
        let mut qualified = variable.name.clone();
        let mut current = self.group(&variable.group_name);
        let mut steps = 0;
        while let Some(group) = current {
            if group.is_root() {
                break;
            }
            steps += 1;
            if steps > self.groups.len() {
                warn!(variable = name, "group chain does not reach the root group");
                break;
            }
            qualified = format!("{}{}{}", group.name, METADATA_SEPARATOR, qualified);
            current = group
                .parent_name
                .as_deref()
                .and_then(|parent| self.group(parent));
        }
        Some(qualified)
    }

    /// Names of every paper indicator variable, in registry order.
    pub fn paper_ucq_names(&self) -> Vec<String> {
        self.variables
            .iter()
            .filter(|variable| variable.is_paper_ucq())
            .map(|variable| variable.name.clone())
            .collect()
    }

    /// Paper indicators pointing at the given single-choice question.
    pub fn paper_indicators<'a>(&'a self, ucq_name: &'a str) -> Vec<&'a Variable> {
        self.variables
            .iter()
            .filter(|variable| {
                matches!(&variable.kind, VariableKind::PaperUcq { ucq_name: owner, .. } if owner == ucq_name)
            })
            .collect()
    }

    /// Checks the structural invariants of the group tree and variable owners.
    pub fn validate(&self) -> Result<()> {
        let roots = self.groups.iter().filter(|group| group.is_root()).count();
        match roots {
            0 => return Err(ModelError::MissingRootGroup),
            1 => {}
            count => return Err(ModelError::MultipleRootGroups { count }),
        }
        for group in &self.groups {
            if let Some(parent) = &group.parent_name
                && self.group(parent).is_none()
            {
                return Err(ModelError::UnknownParentGroup {
                    group: group.name.clone(),
                    parent: parent.clone(),
                });
            }
        }
        for group in &self.groups {
            let mut seen = BTreeSet::new();
            let mut current = Some(group);
            while let Some(node) = current {
                if !seen.insert(node.name.as_str()) {
                    return Err(ModelError::GroupCycle {
                        group: group.name.clone(),
                    });
                }
                current = node.parent_name.as_deref().and_then(|p| self.group(p));
            }
        }
        for variable in self.variables.iter() {
            if self.group(&variable.group_name).is_none() {
                return Err(ModelError::UnknownGroup {
                    variable: variable.name.clone(),
                    group: variable.group_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Union of several models; the first definition of a group or variable wins.
    pub fn merged<'a>(models: impl IntoIterator<Item = &'a MetadataModel>) -> MetadataModel {
        let mut merged = MetadataModel::new();
        for model in models {
            for group in &model.groups {
                if group.name != ROOT_GROUP_NAME && merged.group(&group.name).is_none() {
                    merged.put_group(group.clone());
                }
            }
            for variable in model.variables.iter() {
                if !merged.variables.contains(&variable.name) {
                    merged.put_variable(variable.clone());
                }
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::VariableType;

    #[test]
    fn registry_remove_keeps_order_and_index() {
        let mut registry = VariableRegistry::default();
        for name in ["A", "B", "C"] {
            registry.insert(Variable::new(name, ROOT_GROUP_NAME, VariableType::String));
        }
        registry.remove("A");
        let names: Vec<&str> = registry.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
        assert_eq!(registry.get("C").map(|v| v.name.as_str()), Some("C"));
    }

    #[test]
    fn fully_qualified_name_stops_on_cycle() {
        let mut model = MetadataModel::new();
        model.put_group(Group::new("G1", "G2"));
        model.put_group(Group::new("G2", "G1"));
        model.put_variable(Variable::new("X", "G1", VariableType::String));
        assert!(model.fully_qualified_name("X").is_some());
        assert!(matches!(model.validate(), Err(ModelError::GroupCycle { .. })));
    }
}
