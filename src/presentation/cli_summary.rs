use crate::application::monitoring::PerfReport;
use crate::domain::row_diff::TableComparisonResult;
use crate::domain::schema_diff::{ObjectDiff, SchemaComparisonResult, TableDiff};
use crate::domain::snapshot::SchemaSnapshot;
use crate::domain::value_objects::DiffType;
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

// ─── Data summary ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct DataRow {
    table: String,
    added: String,
    modified: String,
    removed: String,
    unchanged: String,
}

/// Print one line per compared table with its row counts.
pub fn print_data_summary(results: &[TableComparisonResult]) {
    println!();
    println!("{}", "LITEDIFF DATA SUMMARY".bold().cyan());
    println!();

    if results.iter().all(|r| !r.has_changes()) {
        println!("{}", "No row differences detected.".italic());
        return;
    }

    let rows: Vec<DataRow> = results
        .iter()
        .map(|r| DataRow {
            table: if r.source_table == r.target_table {
                r.target_table.bold().to_string()
            } else {
                format!("{} → {}", r.source_table.blue(), r.target_table.green())
            },
            added: r.summary.added.to_string().green().to_string(),
            modified: r.summary.modified.to_string().yellow().to_string(),
            removed: r.summary.removed.to_string().red().to_string(),
            unchanged: r.summary.unchanged.to_string().dimmed().to_string(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=4)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    println!();
}

// ─── Schema summary ───────────────────────────────────────────────────────────

#[derive(Tabled)]
struct SchemaRow {
    table: String,
    status: String,
    columns: usize,
    indexes: usize,
    #[tabled(rename = "foreign keys")]
    foreign_keys: usize,
    triggers: usize,
}

fn changed<T, C>(diffs: &[ObjectDiff<T, C>]) -> usize {
    diffs.iter().filter(|d| !d.is_unchanged()).count()
}

fn status(diff: &TableDiff) -> String {
    match diff.diff_type {
        DiffType::Added => "added".green().to_string(),
        DiffType::Removed => "removed".red().to_string(),
        DiffType::Modified => "modified".yellow().to_string(),
        DiffType::Unchanged => "unchanged".dimmed().to_string(),
    }
}

/// Print the changed tables of a schema comparison.
pub fn print_schema_summary(result: &SchemaComparisonResult) {
    println!();
    println!("{}", "LITEDIFF SCHEMA SUMMARY".bold().cyan());
    println!(
        "{} ({}) → {} ({})",
        result.source_label.blue(),
        result.source_kind,
        result.target_label.green(),
        result.target_kind
    );
    println!();

    if result.summary.is_identical() {
        println!("{}", "Schemas are identical.".italic());
        return;
    }

    let rows: Vec<SchemaRow> = result
        .table_diffs
        .iter()
        .filter(|d| d.diff_type != DiffType::Unchanged)
        .map(|d| SchemaRow {
            table: d.qualified_name().bold().to_string(),
            status: status(d),
            columns: changed(&d.column_diffs),
            indexes: changed(&d.index_diffs),
            foreign_keys: changed(&d.foreign_key_diffs),
            triggers: changed(&d.trigger_diffs),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let s = &result.summary;
    println!(
        "  {} added  ·  {} modified  ·  {} removed  ·  {} unchanged",
        s.added.to_string().green(),
        s.modified.to_string().yellow(),
        s.removed.to_string().red(),
        s.unchanged.to_string().dimmed(),
    );
    println!();
}

// ─── Warnings ─────────────────────────────────────────────────────────────────

pub fn print_warnings(warnings: &[String]) {
    for w in warnings {
        println!("{} {}", "warning:".bold().yellow(), w);
    }
    if !warnings.is_empty() {
        println!();
    }
}

// ─── Snapshots ────────────────────────────────────────────────────────────────

pub fn print_snapshot_saved(snapshot: &SchemaSnapshot, id: &str) {
    if id != snapshot.id {
        println!(
            "{} schema unchanged since snapshot {}",
            "✓".green(),
            id.bright_yellow()
        );
    } else {
        let fp = snapshot.fingerprint.as_str();
        println!(
            "{} snapshot {} saved ({} tables, fingerprint {})",
            "✓".green(),
            id.bright_yellow(),
            snapshot.table_count(),
            fp.get(..12).unwrap_or(fp)
        );
    }
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    connection: String,
    table: String,
    #[tabled(rename = "rows")]
    rows: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            connection: t.connection.clone(),
            table: t.table.bold().to_string(),
            rows: t.rows.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..=4)).with(Alignment::right()))
        .to_string();

    println!("{table}");
    println!(
        "  Total: {} row(s) fetched  ·  {} ms elapsed",
        report.total_rows_fetched.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}
