use anyhow::{bail, Context, Result};
use std::sync::Arc;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of litediff's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any async entry point.
///
/// | Variant | `tracing` level | When to use                         |
/// |---------|-----------------|-------------------------------------|
/// | `Error` | `error`         | `--quiet` / CI scripting            |
/// | `Info`  | `info`          | Default, shows per-table timings    |
/// | `Debug` | `debug`         | `--verbose`, shows SQL queries too  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for litediff.
///
/// Respects `RUST_LOG` when set, falling back to `level` otherwise. Call once
/// at startup; library consumers who manage their own subscriber should skip
/// this.
///
/// Only available with the `cli` feature (pulls in `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "litediff=error",
        LogLevel::Info => "litediff=info",
        LogLevel::Debug => "litediff=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::comparison::{ComparisonService, TableCompareRequest};
pub use application::migration::MigrationGenerator;
pub use application::monitoring::PerfReport;
pub use application::row_diff::TableDiffer;
pub use application::schema_diff::compare_schemas;
pub use application::sync_sql::SyncSqlGenerator;
pub use domain::error::{CompareError, CoreError, ErrorCode, GenerationError, SourceError};
pub use domain::outcome::{Failure, Outcome};
pub use domain::report::Report;
pub use domain::row_diff::{ColumnChange, ComparisonSummary, RowDiff, TableComparisonResult};
pub use domain::row_identity::{make_row_identity, RowIdentity};
pub use domain::schema::{
    ColumnSchema, ForeignKeySchema, IndexSchema, SchemaDescription, TableSchema, TriggerSchema,
};
pub use domain::schema_diff::{SchemaComparisonResult, SchemaEndpoint, TableDiff};
pub use domain::snapshot::{MapSnapshotStore, SchemaSnapshot};
pub use domain::sync::{GeneratedSql, SyncRequest};
pub use domain::value::{normalize_value, CellValue, RowData};
pub use domain::value_objects::{ColumnName, DiffType, ExcludedColumns, SourceKind, TableRef};
pub use infrastructure::config::{AppConfig, DbConfig, OutputConfig, SyncConfig, TableConfig};
pub use infrastructure::db::client::SqliteConnections;
pub use infrastructure::snapshot_store::FileSnapshotStore;

use crate::application::monitoring::{MonitoringDiffer, MonitoringRowSource};
use crate::domain::ports::{Differ, RowSource, SchemaSource};

// ─── Boundary entry points ───
//
// Pure, synchronous, and never panicking on bad input: failures come back as
// `Outcome::Failure` carrying a message and an `ErrorCode`.

/// Row-level comparison of two in-memory row sets.
pub fn compare_table_rows(
    source_table: &TableRef,
    target_table: &TableRef,
    source: &[RowData],
    target: &[RowData],
    primary_keys: &[ColumnName],
) -> Outcome<TableComparisonResult> {
    TableDiffer::new()
        .compare_table(source_table, target_table, source, target, primary_keys)
        .into()
}

/// DML that makes the target table's rows match the source's.
pub fn generate_sync_sql(request: &SyncRequest) -> Outcome<GeneratedSql> {
    application::sync_sql::generate_sync_sql(request).into()
}

/// DDL that makes the target schema match the source's.
pub fn generate_migration_sql(result: &SchemaComparisonResult) -> Outcome<GeneratedSql> {
    application::migration::generate_migration_sql(result).into()
}

// ─── Configured runs ───

pub const SOURCE: &str = "source";
pub const TARGET: &str = "target";

/// One compared table and the sync SQL generated from it.
#[derive(Debug, Clone)]
pub struct TableSync {
    pub comparison: TableComparisonResult,
    pub sql: GeneratedSql,
}

/// Compare every configured table and generate its sync SQL.
///
/// Returns the per-table results and a [`PerfReport`] with fetch and diff
/// timings.
pub async fn run_data(cfg: &AppConfig) -> Result<(Vec<TableSync>, PerfReport)> {
    if cfg.tables.is_empty() {
        bail!("No tables configured: add at least one [[tables]] entry");
    }

    let report = PerfReport::new();
    let conns = Arc::new(open_both(cfg).await?);
    let rows: Arc<dyn RowSource> = Arc::new(MonitoringRowSource::new(conns.clone(), Arc::clone(&report)));
    let differ: Arc<dyn Differ> = Arc::new(MonitoringDiffer::new(
        Arc::new(TableDiffer::new()),
        Arc::clone(&report),
    ));
    let snapshots = Arc::new(FileSnapshotStore::new(&cfg.output.snapshot_dir));
    let service = ComparisonService::new(rows, conns, snapshots, differ);

    let requests: Vec<TableCompareRequest> = cfg
        .tables
        .iter()
        .map(|t| TableCompareRequest {
            source_connection: SOURCE.to_string(),
            target_connection: TARGET.to_string(),
            source_table: t.source_table(),
            target_table: t.target_table(),
            primary_keys: t.primary_key_columns(),
            excluded: t.excluded_columns.clone(),
        })
        .collect();

    let comparisons = service.compare_tables(&requests).await?;

    let generator = SyncSqlGenerator::default();
    let mut results = Vec::with_capacity(comparisons.len());
    for comparison in comparisons {
        let request = SyncRequest::new(comparison.clone())
            .with_inserts(cfg.sync.include_inserts)
            .with_updates(cfg.sync.include_updates)
            .with_deletes(cfg.sync.include_deletes);
        let sql = generator
            .generate(&request)
            .with_context(|| format!("Failed to generate sync SQL for {}", comparison.target_table))?;
        results.push(TableSync { comparison, sql });
    }

    Ok((results, PerfReport::snapshot(&report)))
}

/// Compare the schemas of the configured databases and generate the migration.
///
/// With `source_snapshot`, the stored snapshot of that id stands in for the
/// source database.
pub async fn run_schema(
    cfg: &AppConfig,
    source_snapshot: Option<&str>,
) -> Result<(SchemaComparisonResult, GeneratedSql)> {
    let store = FileSnapshotStore::new(&cfg.output.snapshot_dir);

    // A snapshot source never reads the source database.
    let conns = Arc::new(match source_snapshot {
        Some(_) => {
            let mut conns = SqliteConnections::new();
            conns.open(TARGET, &cfg.target).await?;
            conns
        }
        None => open_both(cfg).await?,
    });

    let source = match source_snapshot {
        Some(id) => {
            let snapshot = store
                .load(id)?
                .ok_or_else(|| SourceError::not_found("snapshot", id))?;
            SchemaEndpoint::snapshot(id, &snapshot.label)
        }
        None => SchemaEndpoint::connection(SOURCE, &cfg.source.label()),
    };
    let target = SchemaEndpoint::connection(TARGET, &cfg.target.label());

    let service = ComparisonService::new(
        conns.clone(),
        conns,
        Arc::new(store),
        Arc::new(TableDiffer::new()),
    );
    let comparison = service.compare_schemas(&source, &target).await?;
    let sql = MigrationGenerator::default()
        .generate(&comparison)
        .context("Failed to generate migration SQL")?;
    Ok((comparison, sql))
}

/// Capture the schema of the source database (or the target, when `target`
/// is set) into the snapshot directory.
///
/// Returns the captured snapshot and the id it is stored under, which is an
/// older snapshot's id when the schema has not changed since.
pub async fn capture_snapshot(
    cfg: &AppConfig,
    target: bool,
    label: Option<&str>,
) -> Result<(SchemaSnapshot, String)> {
    let (id, db) = if target { (TARGET, &cfg.target) } else { (SOURCE, &cfg.source) };

    let mut conns = SqliteConnections::new();
    conns.open(id, db).await?;
    let schemas = conns.fetch_schema(id).await?;

    let snapshot = SchemaSnapshot::capture(label.unwrap_or(&db.label()), schemas);
    let stored = FileSnapshotStore::new(&cfg.output.snapshot_dir).save(&snapshot)?;
    Ok((snapshot, stored))
}

// ─── Private helpers ───────────────────────────────────────────────────────────

async fn open_both(cfg: &AppConfig) -> Result<SqliteConnections> {
    let mut conns = SqliteConnections::new();
    conns.open(SOURCE, &cfg.source).await?;
    conns.open(TARGET, &cfg.target).await?;
    Ok(conns)
}
