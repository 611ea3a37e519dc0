//! Sidecar file listing the issues of a run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use harmonia_transform::{Issue, IssueSeverity};

use crate::error::{Result, io_error};

pub const ERROR_FILE_NAME: &str = "errors.txt";

fn severity_label(severity: IssueSeverity) -> &'static str {
    match severity {
        IssueSeverity::Error => "ERROR",
        IssueSeverity::Warning => "WARN",
    }
}

pub fn render_issues(issues: &[Issue], generated_at: &str) -> String {
    let mut content = format!("Issues found during processing ({generated_at})\n\n");
    for issue in issues {
        content.push_str(&format!("[{}] {issue}\n", severity_label(issue.severity())));
    }
    content
}

/// Writes `errors.txt` under `out_dir`. Nothing is written without issues.
pub fn write_error_file(issues: &[Issue], out_dir: &Path) -> Result<Option<PathBuf>> {
    if issues.is_empty() {
        return Ok(None);
    }
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;
    let path = out_dir.join(ERROR_FILE_NAME);
    let generated_at = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    fs::write(&path, render_issues(issues, &generated_at)).map_err(io_error(&path))?;
    Ok(Some(path))
}
