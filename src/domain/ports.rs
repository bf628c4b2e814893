use crate::domain::{
    error::{CompareError, SourceError},
    report::Report,
    row_diff::TableComparisonResult,
    schema::SchemaDescription,
    value::RowData,
    value_objects::{ColumnName, TableRef},
};
use anyhow::Result;
use async_trait::async_trait;

/// Port: rows of a live table (implemented by SqliteConnections)
///
/// Implementations return every row; the core has no pagination.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_table_rows(
        &self,
        connection_id: &str,
        table: &TableRef,
        primary_keys: &[ColumnName],
    ) -> Result<Vec<RowData>, SourceError>;
}

/// Port: schema of a connection or a snapshot (implemented by
/// SqliteConnections, MapSnapshotStore and FileSnapshotStore)
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn fetch_schema(&self, id: &str) -> Result<Vec<SchemaDescription>, SourceError>;
}

/// Port: row comparison algorithm (implemented by TableDiffer)
pub trait Differ: Send + Sync {
    fn compare_table(
        &self,
        source_table: &TableRef,
        target_table: &TableRef,
        source: &[RowData],
        target: &[RowData],
        pk_cols: &[ColumnName],
    ) -> Result<TableComparisonResult, CompareError>;
}

/// Port: output formatting (implemented by JsonWriter, SqlWriter)
pub trait OutputWriter: Send + Sync {
    /// Serializes the report to a string (JSON, SQL, etc.)
    fn format(&self, report: &Report<'_>) -> Result<String>;
    /// Extension of the produced file (e.g. "json", "sql")
    fn extension(&self) -> &'static str;
}
