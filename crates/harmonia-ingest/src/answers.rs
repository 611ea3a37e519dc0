//! Raw answer files.
//!
//! Answers arrive in long form: one row per survey unit and one row per
//! occurrence of a group, keyed by the unit identifier and one column per
//! group identifier. Every column is read as a string; typed variables are
//! cast once the layout is complete.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use harmonia_model::constants::ROOT_IDENTIFIER_NAME;
use harmonia_model::{MetadataModel, VariableType};
use harmonia_transform::Dataset;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Picks `;` when the header line has more semicolons than commas.
fn detect_separator(path: &Path) -> Result<u8> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let mut header = String::new();
    BufReader::new(file)
        .read_line(&mut header)
        .map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    Ok(if semicolons > commas { b';' } else { b',' })
}

fn read_string_table(path: &Path) -> Result<DataFrame> {
    let separator = detect_separator(path)?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Shapes a string table into a unimodal binding.
///
/// - adds missing group identifier columns and fills null ones with `""`
/// - adds a null column for every metadata variable absent from the table
/// - copies root-group answers onto every row of the same unit
/// - casts INTEGER variables to `Int64` and NUMBER variables to `Float64`
pub fn prepare_answers(data: DataFrame, metadata: &MetadataModel) -> Result<Dataset> {
    let present: Vec<String> = data
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let groups = metadata.sub_group_names();
    let identifiers = metadata.identifier_names();

    let mut layout: Vec<Expr> = Vec::new();
    for group in &groups {
        if present.contains(group) {
            layout.push(col(group.as_str()).fill_null(lit("")));
        } else {
            debug!(group = %group, "group identifier column added");
            layout.push(lit("").alias(group.as_str()));
        }
    }
    for variable in metadata.variables().iter() {
        if !present.contains(&variable.name) && !identifiers.contains(&variable.name) {
            layout.push(
                lit(Null {})
                    .cast(DataType::String)
                    .alias(variable.name.as_str()),
            );
        }
    }

    let unit = col(ROOT_IDENTIFIER_NAME);
    let mut typed: Vec<Expr> = Vec::new();
    for variable in metadata.variables().iter() {
        if identifiers.contains(&variable.name) {
            continue;
        }
        let mut expr = col(variable.name.as_str());
        if !groups.is_empty() && metadata.is_in_root_group(&variable.name) {
            expr = expr.drop_nulls().first().over([unit.clone()]);
        }
        expr = match variable.variable_type {
            VariableType::Integer => expr.cast(DataType::Int64),
            VariableType::Number => expr.cast(DataType::Float64),
            _ => expr,
        };
        typed.push(expr.alias(variable.name.as_str()));
    }

    let mut frame = data.lazy();
    if !layout.is_empty() {
        frame = frame.with_columns(layout);
    }
    if !typed.is_empty() {
        frame = frame.with_columns(typed);
    }
    let data = frame.collect()?;

    let mut keys = vec![ROOT_IDENTIFIER_NAME.to_string()];
    keys.extend(groups);
    Ok(Dataset::new(data, keys))
}

/// Reads an answers file and shapes it with [`prepare_answers`].
pub fn read_answers(path: &Path, metadata: &MetadataModel) -> Result<Dataset> {
    let data = read_string_table(path)?;
    if data.get_column_index(ROOT_IDENTIFIER_NAME).is_none() {
        return Err(IngestError::MissingColumn {
            column: ROOT_IDENTIFIER_NAME.to_string(),
            path: path.to_path_buf(),
        });
    }
    let dataset = prepare_answers(data, metadata)?;
    info!(
        path = %path.display(),
        rows = dataset.height(),
        columns = dataset.width(),
        "answers loaded"
    );
    Ok(dataset)
}
