//! JSON metadata descriptors.
//!
//! One descriptor per mode lists the groups, the collected variables and the
//! calculated variables of the questionnaire. [`JsonMetadataSource`] serves
//! them to the pipeline context.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use harmonia_model::constants::ROOT_GROUP_NAME;
use harmonia_model::{
    CalculatedVariable, CalculatedVariables, Group, MetadataModel, Variable, VariableType,
};
use harmonia_transform::{MetadataSource, TransformError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CampaignConfig;
use crate::error::{IngestError, Result, read_file};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDescriptor {
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub variables: Vec<Variable>,
    #[serde(default)]
    pub calculated: Vec<CalculatedVariable>,
}

impl MetadataDescriptor {
    /// Builds the metadata model and calculated variables of the descriptor.
    ///
    /// Calculated variables missing from `variables` are registered as
    /// STRING variables of the root group so they reach the output tables.
    pub fn into_model(self) -> harmonia_model::Result<(MetadataModel, CalculatedVariables)> {
        let mut model = MetadataModel::new();
        for group in self.groups {
            model.put_group(group);
        }
        for variable in self.variables {
            model.put_variable(variable);
        }
        for calculated in &self.calculated {
            if model.variable(&calculated.name).is_none() {
                debug!(variable = %calculated.name, "calculated variable added to root group");
                model.put_variable(Variable::new(
                    calculated.name.clone(),
                    ROOT_GROUP_NAME,
                    VariableType::String,
                ));
            }
        }
        model.validate()?;
        Ok((model, self.calculated.into_iter().collect()))
    }
}

pub fn load_metadata_descriptor(path: &Path) -> Result<MetadataDescriptor> {
    let text = read_file(path)?;
    serde_json::from_str(&text).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a descriptor file and builds its model.
pub fn load_metadata(path: &Path) -> Result<(MetadataModel, CalculatedVariables)> {
    load_metadata_descriptor(path)?
        .into_model()
        .map_err(|source| IngestError::Metadata {
            path: path.to_path_buf(),
            source,
        })
}

/// Metadata source reading one descriptor file per mode.
#[derive(Debug, Clone, Default)]
pub struct JsonMetadataSource {
    files: BTreeMap<String, PathBuf>,
}

impl JsonMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_campaign(config: &CampaignConfig) -> Self {
        let mut source = Self::new();
        for mode in &config.modes {
            source.insert(mode.name.clone(), mode.metadata_file.clone());
        }
        source
    }

    pub fn insert(&mut self, mode: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.insert(mode.into(), path.into());
    }

    fn load(&self, mode: &str) -> harmonia_transform::Result<(MetadataModel, CalculatedVariables)> {
        let path = self
            .files
            .get(mode)
            .ok_or_else(|| TransformError::UnknownMode(mode.to_string()))?;
        load_metadata(path).map_err(|error| TransformError::MetadataSource {
            mode: mode.to_string(),
            message: error.to_string(),
        })
    }
}

impl MetadataSource for JsonMetadataSource {
    fn metadata(&self, mode: &str) -> harmonia_transform::Result<MetadataModel> {
        self.load(mode).map(|(model, _)| model)
    }

    fn calculated_variables(&self, mode: &str) -> harmonia_transform::Result<CalculatedVariables> {
        self.load(mode).map(|(_, calculated)| calculated)
    }
}
