use crate::domain::{ports::OutputWriter, report::Report};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use self::{json::JsonWriter, sql::SqlWriter};

pub mod json;
pub mod sql;

/// Register available writers - OCP: add new ones without touching main.rs
pub fn all_writers() -> Vec<Box<dyn OutputWriter>> {
    vec![Box::new(JsonWriter), Box::new(SqlWriter)]
}

pub fn writer_for(format: &str) -> Option<Box<dyn OutputWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "sql" => Some(Box::new(SqlWriter)),
        _ => None,
    }
}

/// Writes the report to `<dir>/<stem>.<ext>` via the chosen writer and returns
/// the path written.
pub fn write_to_file(writer: &dyn OutputWriter, report: &Report<'_>, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let content = writer.format(report)?;
    let path = dir.join(format!("{}.{}", report.file_stem(), writer.extension()));
    fs::write(&path, &content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
