//! # litediff — library usage example
//!
//! Two ways of consuming litediff as a Rust library:
//!
//! 1. **From a config file**: same runs as the CLI, SQL written to disk
//! 2. **In-memory rows**: the boundary functions, no database needed
//!
//! Run with a config file:
//!   cargo run --example compare_as_lib -- litediff.toml
//!
//! Run the in-memory walkthrough:
//!   cargo run --example compare_as_lib

use std::path::Path;

use anyhow::Result;
use litediff::{
    presentation::writers::{all_writers, write_to_file},
    AppConfig, ColumnName, Outcome, Report, RowData, RowDiff, SyncRequest, TableRef,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some(path) => from_config_file(Path::new(path)).await,
        None => in_memory(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 1: load config from a TOML file (same as the CLI does internally)
// ─────────────────────────────────────────────────────────────────────────────
async fn from_config_file(path: &Path) -> Result<()> {
    println!("=== Pattern 1: from config file ({}) ===\n", path.display());

    let cfg = AppConfig::load(Some(path))?;
    let (results, perf) = litediff::run_data(&cfg).await?;

    for r in &results {
        let report = Report::Data { comparison: &r.comparison, sql: &r.sql };
        for writer in all_writers() {
            let written = write_to_file(writer.as_ref(), &report, Path::new(&cfg.output.dir))?;
            println!("Written: {}", written.display());
        }
    }
    println!("\n{} row(s) fetched in {} ms", perf.total_rows_fetched, perf.total_ms);

    let (schema, migration) = litediff::run_schema(&cfg, None).await?;
    println!(
        "Schema: {} added, {} modified, {} removed table(s); {} migration statement(s)",
        schema.summary.added,
        schema.summary.modified,
        schema.summary.removed,
        migration.statements.len()
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pattern 2: compare rows you already hold and generate the sync SQL
// ─────────────────────────────────────────────────────────────────────────────
fn in_memory() -> Result<()> {
    println!("=== Pattern 2: in-memory rows ===\n");

    let source: Vec<RowData> = serde_json::from_value(json!([
        {"id": 1, "name": "A"},
        {"id": 2, "name": "B"},
    ]))?;
    let target: Vec<RowData> = serde_json::from_value(json!([
        {"id": 2, "name": "b"},
        {"id": 3, "name": "C"},
    ]))?;

    let table = TableRef::main("t");
    let pk = ColumnName::list(&["id"]);
    let comparison = match litediff::compare_table_rows(&table, &table, &source, &target, &pk) {
        Outcome::Success(c) => c,
        Outcome::Failure(f) => anyhow::bail!("{} ({:?})", f.error, f.error_code),
    };

    for diff in &comparison.row_diffs {
        let detail = match diff {
            RowDiff::Modified { column_changes, .. } => column_changes
                .iter()
                .map(|c| c.column_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };
        println!("{:>9}  {}  {}", diff.diff_type().to_string(), diff.primary_key().canonical_key(), detail);
    }

    let request = SyncRequest::new(comparison).with_deletes(true);
    let sql = litediff::generate_sync_sql(&request).into_result()?;
    println!("\n{}\n", sql.sql);
    for w in &sql.warnings {
        println!("warning: {w}");
    }

    // The boundary shape, as a non-Rust caller would receive it.
    println!("\n{}", serde_json::to_string_pretty(&litediff::generate_sync_sql(&request))?);
    Ok(())
}
