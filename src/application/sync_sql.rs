use std::collections::HashSet;

use tracing::info;

use crate::domain::{
    dialect::{QueryDialect, SqliteDialect},
    error::GenerationError,
    row_diff::{ColumnChange, RowDiff, TableComparisonResult},
    row_identity::{make_row_identity, RowIdentity},
    sync::{GeneratedSql, SyncRequest},
    value::RowData,
    value_objects::ColumnName,
};

/// Generates the DML that makes the target table match the source.
///
/// Statements come out grouped: every DELETE, then every UPDATE, then every
/// INSERT, each group in row-diff order.
pub struct SyncSqlGenerator {
    dialect: Box<dyn QueryDialect>,
}

impl Default for SyncSqlGenerator {
    fn default() -> Self {
        Self::new(Box::new(SqliteDialect))
    }
}

impl SyncSqlGenerator {
    pub fn new(dialect: Box<dyn QueryDialect>) -> Self {
        Self { dialect }
    }

    pub fn generate(&self, request: &SyncRequest) -> Result<GeneratedSql, GenerationError> {
        let cmp = &request.comparison;
        validate(cmp)?;

        let selection = selection_filter(&request.selected_rows, &cmp.primary_keys)?;
        let selected = |d: &&RowDiff| selection.as_ref().map_or(true, |s| s.contains(d.primary_key()));

        let table = self.dialect.qualified(&cmp.target_schema, &cmp.target_table);

        let mut deletes = Vec::new();
        let mut updates = Vec::new();
        let mut inserts = Vec::new();

        for diff in cmp.row_diffs.iter().filter(selected) {
            match diff {
                RowDiff::Removed { primary_key, .. } if request.include_deletes => {
                    deletes.push(format!(
                        "DELETE FROM {} WHERE {};",
                        table,
                        self.where_clause(&cmp.primary_keys, primary_key)
                    ));
                }
                RowDiff::Modified {
                    primary_key,
                    column_changes,
                    ..
                } if request.include_updates => {
                    updates.push(format!(
                        "UPDATE {} SET {} WHERE {};",
                        table,
                        self.set_clause(column_changes),
                        self.where_clause(&cmp.primary_keys, primary_key)
                    ));
                }
                RowDiff::Added { source_row, .. } if request.include_inserts => {
                    let (cols, vals) = self.insert_columns_values(source_row);
                    inserts.push(format!("INSERT INTO {} ({}) VALUES ({});", table, cols, vals));
                }
                _ => {}
            }
        }

        let mut warnings = Vec::new();
        if !deletes.is_empty() {
            warnings.push(format!(
                "{} row(s) will be deleted from {}. This cannot be undone.",
                deletes.len(),
                table
            ));
        }

        let delete_count = deletes.len();
        let update_count = updates.len();
        let insert_count = inserts.len();

        let mut statements = deletes;
        statements.append(&mut updates);
        statements.append(&mut inserts);

        if statements.is_empty() {
            warnings.push(
                "No SQL statements were generated. Check that the selected rows differ and \
                 that the matching statement types are enabled."
                    .to_string(),
            );
        }

        info!(
            dialect = self.dialect.name(),
            table = %table,
            deletes = delete_count,
            updates = update_count,
            inserts = insert_count,
            "sync SQL generated"
        );

        Ok(GeneratedSql::new(statements, warnings))
    }

    /// `col = <literal>` per key column joined with ` AND `; `col IS NULL` for
    /// null components.
    fn where_clause(&self, key_columns: &[String], key: &RowIdentity) -> String {
        key_columns
            .iter()
            .zip(key.values())
            .map(|(col, val)| {
                let col_q = self.dialect.quote_ident(col);
                if val.is_null() {
                    format!("{} IS NULL", col_q)
                } else {
                    format!("{} = {}", col_q, self.dialect.sql_literal(val))
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn set_clause(&self, changes: &[ColumnChange]) -> String {
        changes
            .iter()
            .map(|c| {
                format!(
                    "{} = {}",
                    self.dialect.quote_ident(&c.column_name),
                    self.dialect.sql_literal(&c.source_value)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn insert_columns_values(&self, row: &RowData) -> (String, String) {
        let cols: Vec<String> = row.keys().map(|k| self.dialect.quote_ident(k)).collect();
        let vals: Vec<String> = row.values().map(|v| self.dialect.sql_literal(v)).collect();
        (cols.join(", "), vals.join(", "))
    }
}

/// Generate sync SQL with the SQLite dialect.
pub fn generate_sync_sql(request: &SyncRequest) -> Result<GeneratedSql, GenerationError> {
    SyncSqlGenerator::default().generate(request)
}

// ─── Validation ───

/// Reject row diffs the differencer never produces. Runs over every diff
/// before any statement is built, so a failure never yields partial SQL.
fn validate(cmp: &TableComparisonResult) -> Result<(), GenerationError> {
    if cmp.primary_keys.is_empty() {
        return Err(GenerationError::InvalidComparison(
            "comparison has no primary key columns".to_string(),
        ));
    }
    if cmp.target_table.is_empty() {
        return Err(GenerationError::InvalidComparison(
            "comparison has no target table".to_string(),
        ));
    }

    for diff in &cmp.row_diffs {
        let key = diff.primary_key();
        let malformed = |reason: &str| GenerationError::MalformedRowDiff {
            key: key.describe(&cmp.primary_keys),
            reason: reason.to_string(),
        };

        if key.len() != cmp.primary_keys.len() {
            return Err(malformed(&format!(
                "key has {} value(s) but the comparison declares {} key column(s)",
                key.len(),
                cmp.primary_keys.len()
            )));
        }
        match diff {
            RowDiff::Added { source_row, .. } if source_row.is_empty() => {
                return Err(malformed("added row has no columns"));
            }
            RowDiff::Removed { target_row, .. } if target_row.is_empty() => {
                return Err(malformed("removed row has no columns"));
            }
            RowDiff::Modified { column_changes, .. } if column_changes.is_empty() => {
                return Err(malformed("modified row has no column changes"));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Identity set of the selected rows; `None` when nothing was selected.
fn selection_filter(
    selected: &[RowData],
    key_columns: &[String],
) -> Result<Option<HashSet<RowIdentity>>, GenerationError> {
    if selected.is_empty() {
        return Ok(None);
    }
    let pk_cols = ColumnName::list(key_columns);
    selected
        .iter()
        .map(|row| {
            make_row_identity(row, &pk_cols)
                .map_err(|e| GenerationError::InvalidSelection(e.to_string()))
        })
        .collect::<Result<HashSet<_>, _>>()
        .map(Some)
}
