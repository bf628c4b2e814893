use crate::domain::ports::{Differ, RowSource};
use crate::domain::{
    error::{CompareError, SourceError},
    row_diff::TableComparisonResult,
    value::RowData,
    value_objects::{ColumnName, TableRef},
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{info, instrument};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Operation name: "fetch_rows" or "compare_table".
    pub operation: &'static str,
    /// Connection the rows came from; empty for comparisons.
    pub connection: String,
    pub table: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Number of rows involved (fetched or compared).
    pub rows: usize,
}

/// Accumulated performance timings for one litediff run.
///
/// Shared across all decorator instances for the run via `Arc<Mutex<_>>`;
/// render it with [`crate::presentation::cli_summary::print_perf_summary`].
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_rows_fetched: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Copy the current state out of the shared handle.
    pub fn snapshot(report: &Arc<Mutex<Self>>) -> Self {
        report.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        if let Ok(mut r) = report.lock() {
            r.total_ms += timing.duration_ms;
            if timing.operation == "fetch_rows" {
                r.total_rows_fetched += timing.rows;
            }
            r.timings.push(timing);
        }
    }
}

// ─── MonitoringRowSource ─────────────────────────────────────────────────────

/// Decorator: wraps any `RowSource`, measures wall time per fetch and appends
/// it to the shared `PerfReport`.
pub struct MonitoringRowSource {
    inner: Arc<dyn RowSource>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringRowSource {
    pub fn new(inner: Arc<dyn RowSource>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

#[async_trait]
impl RowSource for MonitoringRowSource {
    #[instrument(
        name = "fetch_rows",
        skip(self, table, primary_keys),
        fields(db.connection = %connection_id, db.schema = %table.schema.0, db.table = %table.name.0),
        level = "info"
    )]
    async fn fetch_table_rows(
        &self,
        connection_id: &str,
        table: &TableRef,
        primary_keys: &[ColumnName],
    ) -> Result<Vec<RowData>, SourceError> {
        let start = Instant::now();
        let rows = self
            .inner
            .fetch_table_rows(connection_id, table, primary_keys)
            .await?;
        let duration_ms = start.elapsed().as_millis();

        info!(connection = %connection_id, table = %table.name.0, rows = rows.len(), duration_ms, "fetch_rows completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "fetch_rows",
                connection: connection_id.to_string(),
                table: table.name.0.clone(),
                duration_ms,
                rows: rows.len(),
            },
        );

        Ok(rows)
    }
}

// ─── MonitoringDiffer ────────────────────────────────────────────────────────

/// Decorator: wraps any `Differ`, measures wall time per comparison and
/// appends it to the shared `PerfReport`.
pub struct MonitoringDiffer {
    inner: Arc<dyn Differ>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringDiffer {
    pub fn new(inner: Arc<dyn Differ>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

impl Differ for MonitoringDiffer {
    #[instrument(
        name = "compare_table",
        skip(self, source_table, target_table, source, target, pk_cols),
        fields(
            db.table = %target_table.name.0,
            source.rows = source.len(),
            target.rows = target.len(),
        ),
        level = "info"
    )]
    fn compare_table(
        &self,
        source_table: &TableRef,
        target_table: &TableRef,
        source: &[RowData],
        target: &[RowData],
        pk_cols: &[ColumnName],
    ) -> Result<TableComparisonResult, CompareError> {
        let start = Instant::now();
        let result = self
            .inner
            .compare_table(source_table, target_table, source, target, pk_cols)?;
        let duration_ms = start.elapsed().as_millis();

        let changes = result.summary.changes();
        info!(table = %target_table.name.0, source_rows = source.len(), target_rows = target.len(), changes, duration_ms, "compare_table completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "compare_table",
                connection: String::new(),
                table: target_table.name.0.clone(),
                duration_ms,
                rows: source.len() + target.len(),
            },
        );

        Ok(result)
    }
}
