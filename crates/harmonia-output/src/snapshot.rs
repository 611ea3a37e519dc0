//! Stage snapshots for step-by-step runs.
//!
//! A snapshot directory holds one Arrow IPC file per binding and a
//! `bindings.json` manifest with the identifier roles, the per-mode metadata
//! and the issues accumulated so far.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

use chrono::Utc;
use harmonia_model::{CalculatedVariables, MetadataModel};
use harmonia_transform::{Bindings, Dataset, Issue, PipelineParts};
use polars::prelude::{IpcReader, IpcWriter, SerReader, SerWriter};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{OutputError, Result, io_error};

pub const MANIFEST_FILE_NAME: &str = "bindings.json";

const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct BindingEntry {
    name: String,
    file: String,
    identifiers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    version: u32,
    saved_at: String,
    bindings: Vec<BindingEntry>,
    #[serde(default)]
    metadata: BTreeMap<String, MetadataModel>,
    #[serde(default)]
    calculated: BTreeMap<String, CalculatedVariables>,
    #[serde(default)]
    issues: Vec<Issue>,
}

fn file_name(index: usize, binding: &str) -> String {
    let sanitized: String = binding
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    format!("{index:03}_{sanitized}.arrow")
}

/// Saves `parts` under `dir`, replacing any previous manifest.
pub fn save_state(dir: &Path, parts: &PipelineParts) -> Result<()> {
    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let mut entries = Vec::with_capacity(parts.bindings.len());
    for (index, (name, dataset)) in parts.bindings.iter().enumerate() {
        let file = file_name(index, name);
        let path = dir.join(&file);
        let mut data = dataset.data().clone();
        let mut writer = File::create(&path).map_err(io_error(&path))?;
        IpcWriter::new(&mut writer).finish(&mut data)?;
        debug!(binding = %name, path = %path.display(), "binding saved");
        entries.push(BindingEntry {
            name: name.clone(),
            file,
            identifiers: dataset.identifier_names(),
        });
    }

    let manifest = Manifest {
        version: MANIFEST_VERSION,
        saved_at: Utc::now().to_rfc3339(),
        bindings: entries,
        metadata: parts.metadata.clone(),
        calculated: parts.calculated.clone(),
        issues: parts.issues.clone(),
    };
    let path = dir.join(MANIFEST_FILE_NAME);
    let json = serde_json::to_string_pretty(&manifest).map_err(|source| {
        OutputError::Manifest {
            path: path.clone(),
            source,
        }
    })?;
    fs::write(&path, json).map_err(io_error(&path))?;
    info!(
        dir = %dir.display(),
        bindings = manifest.bindings.len(),
        issues = manifest.issues.len(),
        "state saved"
    );
    Ok(())
}

/// Restores the state saved by [`save_state`].
pub fn load_state(dir: &Path) -> Result<PipelineParts> {
    let path = dir.join(MANIFEST_FILE_NAME);
    if !path.is_file() {
        return Err(OutputError::MissingSnapshot { path });
    }
    let text = fs::read_to_string(&path).map_err(io_error(&path))?;
    let manifest: Manifest =
        serde_json::from_str(&text).map_err(|source| OutputError::Manifest {
            path: path.clone(),
            source,
        })?;
    if manifest.version != MANIFEST_VERSION {
        warn!(
            found = manifest.version,
            expected = MANIFEST_VERSION,
            "snapshot manifest version differs"
        );
    }

    let mut bindings = Bindings::new();
    for entry in manifest.bindings {
        let path = dir.join(&entry.file);
        if !path.is_file() {
            return Err(OutputError::MissingSnapshot { path });
        }
        let file = File::open(&path).map_err(io_error(&path))?;
        let data = IpcReader::new(file).finish()?;
        bindings.insert(entry.name, Dataset::new(data, entry.identifiers));
    }
    info!(
        dir = %dir.display(),
        bindings = bindings.len(),
        saved_at = %manifest.saved_at,
        "state loaded"
    );
    Ok(PipelineParts {
        bindings,
        metadata: manifest.metadata,
        calculated: manifest.calculated,
        issues: manifest.issues,
    })
}
