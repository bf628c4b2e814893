use std::sync::Arc;

use tracing::{debug, info};

use crate::application::schema_diff::compare_schemas;
use crate::domain::{
    error::{CompareError, CoreError, SourceError},
    fingerprint::schema_fingerprint,
    ports::{Differ, RowSource, SchemaSource},
    row_diff::TableComparisonResult,
    schema::{all_tables, SchemaDescription},
    schema_diff::{SchemaComparisonResult, SchemaEndpoint, TableDiff},
    value::RowData,
    value_objects::{ColumnName, ExcludedColumns, SourceKind, TableRef},
};

/// One table to compare across two connections.
#[derive(Debug, Clone)]
pub struct TableCompareRequest {
    pub source_connection: String,
    pub target_connection: String,
    pub source_table: TableRef,
    pub target_table: TableRef,
    pub primary_keys: Vec<ColumnName>,
    pub excluded: ExcludedColumns,
}

// ─── Comparison Service ───

/// Fetches both sides through the ports, concurrently, then hands them to the
/// synchronous differencers.
pub struct ComparisonService {
    rows: Arc<dyn RowSource>,
    connections: Arc<dyn SchemaSource>,
    snapshots: Arc<dyn SchemaSource>,
    differ: Arc<dyn Differ>,
}

impl ComparisonService {
    pub fn new(
        rows: Arc<dyn RowSource>,
        connections: Arc<dyn SchemaSource>,
        snapshots: Arc<dyn SchemaSource>,
        differ: Arc<dyn Differ>,
    ) -> Self {
        Self {
            rows,
            connections,
            snapshots,
            differ,
        }
    }

    pub async fn compare_table(
        &self,
        req: &TableCompareRequest,
    ) -> Result<TableComparisonResult, CoreError> {
        compare_one(
            Arc::clone(&self.rows),
            Arc::clone(&self.differ),
            req.clone(),
        )
        .await
    }

    /// Compare several tables, one task per table.
    pub async fn compare_tables(
        &self,
        reqs: &[TableCompareRequest],
    ) -> Result<Vec<TableComparisonResult>, CoreError> {
        let mut handles = Vec::with_capacity(reqs.len());

        for req in reqs {
            let rows = Arc::clone(&self.rows);
            let differ = Arc::clone(&self.differ);
            let req = req.clone();
            handles.push(tokio::spawn(compare_one(rows, differ, req)));
        }

        let mut results = Vec::with_capacity(handles.len());
        for h in handles {
            let joined = h
                .await
                .map_err(|e| SourceError::Backend(anyhow::anyhow!("comparison task failed: {e}")))?;
            results.push(joined?);
        }
        Ok(results)
    }

    pub async fn compare_schemas(
        &self,
        source: &SchemaEndpoint,
        target: &SchemaEndpoint,
    ) -> Result<SchemaComparisonResult, CoreError> {
        let (source_schemas, target_schemas) =
            tokio::join!(self.fetch_schema(source), self.fetch_schema(target));
        let source_schemas = source_schemas?;
        let target_schemas = target_schemas?;

        let source_tables = all_tables(&source_schemas);

        // Equal fingerprints mean both sides hold the same set of tables.
        if schema_fingerprint(&source_schemas) == schema_fingerprint(&target_schemas) {
            debug!(source = %source.label, target = %target.label, "fingerprints match, skipping structural diff");
            let diffs = source_tables
                .into_iter()
                .map(|t| TableDiff::unchanged(t.clone(), t))
                .collect();
            return Ok(SchemaComparisonResult::new(source, target, diffs));
        }

        let target_tables = all_tables(&target_schemas);
        Ok(compare_schemas(&source_tables, &target_tables, source, target))
    }

    async fn fetch_schema(&self, endpoint: &SchemaEndpoint) -> Result<Vec<SchemaDescription>, SourceError> {
        let source = match endpoint.kind {
            SourceKind::Connection => &self.connections,
            SourceKind::Snapshot => &self.snapshots,
        };
        source.fetch_schema(&endpoint.id).await
    }
}

async fn compare_one(
    rows: Arc<dyn RowSource>,
    differ: Arc<dyn Differ>,
    req: TableCompareRequest,
) -> Result<TableComparisonResult, CoreError> {
    if let Some(pk) = req.primary_keys.iter().find(|c| req.excluded.contains(&c.0)) {
        return Err(CompareError::InvalidComparisonConfig(format!(
            "primary key column `{}` cannot be excluded",
            pk.0
        ))
        .into());
    }

    let (source_rows, target_rows) = tokio::join!(
        rows.fetch_table_rows(&req.source_connection, &req.source_table, &req.primary_keys),
        rows.fetch_table_rows(&req.target_connection, &req.target_table, &req.primary_keys)
    );
    let source_rows = strip_excluded(source_rows?, &req.excluded);
    let target_rows = strip_excluded(target_rows?, &req.excluded);

    let result = differ.compare_table(
        &req.source_table,
        &req.target_table,
        &source_rows,
        &target_rows,
        &req.primary_keys,
    )?;

    info!(
        table = %req.target_table.name.0,
        added = result.summary.added,
        removed = result.summary.removed,
        modified = result.summary.modified,
        unchanged = result.summary.unchanged,
        "table comparison completed"
    );
    Ok(result)
}

fn strip_excluded(mut rows: Vec<RowData>, excluded: &ExcludedColumns) -> Vec<RowData> {
    if excluded.0.is_empty() {
        return rows;
    }
    for row in &mut rows {
        row.retain(|col, _| !excluded.contains(col));
    }
    rows
}
