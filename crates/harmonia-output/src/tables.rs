//! One CSV table per information level.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use harmonia_model::{MetadataModel, VariableType};
use harmonia_transform::{Dataset, Issue, PipelineContext, TransformError};
use polars::prelude::{CsvWriter, SerWriter};
use tracing::{info, warn};

use crate::error::{Result, io_error};

/// Field separator of the output tables.
pub const OUTPUT_SEPARATOR: u8 = b';';

/// A written information level table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    pub level: String,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

pub fn output_file_name(campaign: &str, level: &str) -> String {
    format!("{campaign}_{level}.csv")
}

/// Ensure an output directory exists.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(io_error(dir))
}

pub fn write_table(dataset: &Dataset, path: &Path) -> Result<()> {
    let mut data = dataset.data().clone();
    let mut file = File::create(path).map_err(io_error(path))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(OUTPUT_SEPARATOR)
        .finish(&mut data)?;
    Ok(())
}

/// Compares observed string lengths with the declared length of every
/// STRING variable of the level.
pub fn check_variable_lengths(
    level: &str,
    dataset: &Dataset,
    metadata: &MetadataModel,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    for variable in metadata.variables().iter() {
        let (VariableType::String, Some(declared)) = (variable.variable_type, variable.length)
        else {
            continue;
        };
        let Ok(column) = dataset.data().column(&variable.name) else {
            continue;
        };
        let Ok(values) = column.str() else {
            continue;
        };
        let observed = values
            .iter()
            .flatten()
            .map(|value| value.chars().count())
            .max()
            .unwrap_or(0);
        if observed > declared as usize {
            warn!(
                dataset = level,
                variable = %variable.name,
                declared,
                observed,
                "values longer than declared length"
            );
            issues.push(Issue::VariableLength {
                dataset: level.to_string(),
                variable: variable.name.clone(),
                declared,
                observed,
            });
        }
    }
    issues
}

/// Writes `<campaign>_<LEVEL>.csv` for every bound information level and
/// records length warnings in the context.
pub fn write_information_levels(
    context: &mut PipelineContext,
    campaign: &str,
    out_dir: &Path,
) -> Result<Vec<LevelTable>> {
    ensure_output_dir(out_dir)?;
    let metadata = context.merged_metadata();
    let mut tables = Vec::new();
    for level in context.information_level_names()? {
        let dataset = context
            .bindings
            .get(&level)
            .ok_or_else(|| TransformError::MissingBinding(level.clone()))?;
        let issues = check_variable_lengths(&level, dataset, &metadata);
        let path = out_dir.join(output_file_name(campaign, &level));
        write_table(dataset, &path)?;
        info!(
            level = %level,
            path = %path.display(),
            rows = dataset.height(),
            "information level written"
        );
        tables.push(LevelTable {
            level: level.clone(),
            path,
            rows: dataset.height(),
            columns: dataset.width(),
        });
        context.issues.extend(issues);
    }
    Ok(tables)
}
