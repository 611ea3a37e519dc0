//! Campaign configuration file.
//!
//! A campaign is described by one JSON document listing its collection modes
//! and the user scripts of the multimodal steps:
//!
//! ```json
//! {
//!   "campaign": "SAMPLETEST",
//!   "modes": [
//!     { "name": "CAWI", "data_format": "LUNATIC", "data_file": "cawi.csv",
//!       "metadata_file": "cawi.json", "script": "cawi.vtl" }
//!   ],
//!   "reconciliation_script": "reconciliation.vtl"
//! }
//! ```
//!
//! Relative paths are resolved against the directory of the configuration file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use harmonia_transform::{DataFormat, ModeSpec, MultimodalScripts};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{IngestError, Result, read_file};

/// One collection mode of the campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeConfig {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_data_format")]
    pub data_format: DataFormat,
    pub data_file: PathBuf,
    pub metadata_file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<PathBuf>,
}

impl ModeConfig {
    pub fn mode_spec(&self) -> ModeSpec {
        ModeSpec {
            name: self.name.clone(),
            data_format: self.data_format,
            script: self.script.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignConfig {
    pub campaign: String,
    pub modes: Vec<ModeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciliation_script: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_script: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub information_levels_script: Option<PathBuf>,
}

impl CampaignConfig {
    pub fn mode(&self, name: &str) -> Option<&ModeConfig> {
        self.modes.iter().find(|mode| mode.name == name)
    }

    pub fn mode_names(&self) -> Vec<String> {
        self.modes.iter().map(|mode| mode.name.clone()).collect()
    }

    pub fn mode_specs(&self) -> Vec<ModeSpec> {
        self.modes.iter().map(ModeConfig::mode_spec).collect()
    }

    pub fn multimodal_scripts(&self) -> MultimodalScripts {
        MultimodalScripts {
            reconciliation: self.reconciliation_script.clone(),
            transformation: self.transformation_script.clone(),
            information_levels: self.information_levels_script.clone(),
        }
    }

    /// Rewrites every relative path as a path under `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        for mode in &mut self.modes {
            resolve(&mut mode.data_file);
            resolve(&mut mode.metadata_file);
            if let Some(script) = mode.script.as_mut() {
                resolve(script);
            }
        }
        for script in [
            self.reconciliation_script.as_mut(),
            self.transformation_script.as_mut(),
            self.information_levels_script.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            resolve(script);
        }
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: String| IngestError::Config {
            path: path.to_path_buf(),
            reason,
        };
        if self.campaign.trim().is_empty() {
            return Err(invalid("campaign name is empty".to_string()));
        }
        if self.modes.is_empty() {
            return Err(invalid("at least one mode is required".to_string()));
        }
        let mut seen = BTreeSet::new();
        for mode in &self.modes {
            if mode.name.trim().is_empty() {
                return Err(invalid("mode name is empty".to_string()));
            }
            if !seen.insert(mode.name.as_str()) {
                return Err(invalid(format!("mode '{}' is declared twice", mode.name)));
            }
        }
        Ok(())
    }
}

fn deserialize_data_format<'de, D>(deserializer: D) -> std::result::Result<DataFormat, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// Reads, validates and path-resolves a campaign configuration file.
pub fn load_campaign(path: &Path) -> Result<CampaignConfig> {
    let text = read_file(path)?;
    let mut config: CampaignConfig =
        serde_json::from_str(&text).map_err(|source| IngestError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.resolve_paths(base);
    debug!(
        campaign = %config.campaign,
        modes = config.modes.len(),
        "campaign configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_resolve_against_base() {
        let mut config = CampaignConfig {
            campaign: "C".to_string(),
            modes: vec![ModeConfig {
                name: "CAWI".to_string(),
                data_format: DataFormat::Lunatic,
                data_file: PathBuf::from("cawi.csv"),
                metadata_file: PathBuf::from("/abs/cawi.json"),
                script: Some(PathBuf::from("scripts/cawi.vtl")),
            }],
            reconciliation_script: None,
            transformation_script: Some(PathBuf::from("t.vtl")),
            information_levels_script: None,
        };
        config.resolve_paths(Path::new("/campaign"));
        let mode = &config.modes[0];
        assert_eq!(mode.data_file, PathBuf::from("/campaign/cawi.csv"));
        assert_eq!(mode.metadata_file, PathBuf::from("/abs/cawi.json"));
        assert_eq!(
            mode.script.as_deref(),
            Some(Path::new("/campaign/scripts/cawi.vtl"))
        );
        assert_eq!(
            config.transformation_script.as_deref(),
            Some(Path::new("/campaign/t.vtl"))
        );
    }
}
