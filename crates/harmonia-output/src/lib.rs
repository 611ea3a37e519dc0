//! Output generation for a processed campaign.
//!
//! - **tables**: one `;`-separated CSV per information level, with length checks
//! - **report**: the `errors.txt` sidecar listing accumulated issues
//! - **snapshot**: Arrow IPC snapshots of the bindings between stages

pub mod error;
pub mod report;
pub mod snapshot;
pub mod tables;

use std::path::{Path, PathBuf};

use harmonia_transform::PipelineContext;
use tracing::info_span;

pub use error::{OutputError, Result};
pub use report::{ERROR_FILE_NAME, render_issues, write_error_file};
pub use snapshot::{MANIFEST_FILE_NAME, load_state, save_state};
pub use tables::{
    LevelTable, OUTPUT_SEPARATOR, check_variable_lengths, output_file_name,
    write_information_levels, write_table,
};

/// Files produced by [`write_outputs`].
#[derive(Debug, Clone, Default)]
pub struct OutputSummary {
    pub tables: Vec<LevelTable>,
    pub error_file: Option<PathBuf>,
}

/// Writes the information level tables, then the error file when the run
/// accumulated issues.
pub fn write_outputs(
    context: &mut PipelineContext,
    campaign: &str,
    out_dir: &Path,
) -> Result<OutputSummary> {
    let span = info_span!("output", campaign, dir = %out_dir.display());
    let _guard = span.enter();
    let tables = write_information_levels(context, campaign, out_dir)?;
    let error_file = write_error_file(&context.issues, out_dir)?;
    Ok(OutputSummary { tables, error_file })
}
