use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::domain::{
    error::CompareError,
    ports::Differ,
    row_diff::{ColumnChange, RowDiff, TableComparisonResult},
    row_identity::{make_row_identity, RowIdentity},
    value::{normalize_cell, CellValue, RowData},
    value_objects::{ColumnName, TableRef},
};

// ─── Row set differencer ───

/// Compare two row sets matched by primary-key identity.
///
/// Output order: source rows in source order (`Added` / `Modified` /
/// `Unchanged`), then the target rows no source row matched, in target order
/// (`Removed`). Only the first occurrence of an identity takes part on either
/// side; later duplicates are skipped with a warning.
pub fn diff_rows(
    source: &[RowData],
    target: &[RowData],
    pk_cols: &[ColumnName],
) -> Result<Vec<RowDiff>, CompareError> {
    if pk_cols.is_empty() {
        return Err(CompareError::InvalidComparisonConfig(
            "at least one primary key column is required".to_string(),
        ));
    }

    let target_ids = target
        .iter()
        .map(|r| make_row_identity(r, pk_cols))
        .collect::<Result<Vec<_>, _>>()?;

    // identity → index of its first occurrence in `target`
    let mut target_index: HashMap<&RowIdentity, usize> = HashMap::with_capacity(target.len());
    for (i, id) in target_ids.iter().enumerate() {
        if target_index.contains_key(id) {
            warn!(key = %id.canonical_key(), "duplicate primary key in target rows, keeping first");
            continue;
        }
        target_index.insert(id, i);
    }

    let mut consumed = vec![false; target.len()];
    let mut seen_source: HashSet<RowIdentity> = HashSet::with_capacity(source.len());
    let mut diffs = Vec::with_capacity(source.len().max(target.len()));

    for source_row in source {
        let id = make_row_identity(source_row, pk_cols)?;
        if !seen_source.insert(id.clone()) {
            warn!(key = %id.canonical_key(), "duplicate primary key in source rows, keeping first");
            continue;
        }

        match target_index.get(&id) {
            None => diffs.push(RowDiff::Added {
                primary_key: id,
                source_row: source_row.clone(),
            }),
            Some(&ti) => {
                consumed[ti] = true;
                let target_row = &target[ti];
                let column_changes = diff_columns(source_row, target_row);
                if column_changes.is_empty() {
                    diffs.push(RowDiff::Unchanged {
                        primary_key: id,
                        source_row: source_row.clone(),
                        target_row: target_row.clone(),
                    });
                } else {
                    diffs.push(RowDiff::Modified {
                        primary_key: id,
                        source_row: source_row.clone(),
                        target_row: target_row.clone(),
                        column_changes,
                    });
                }
            }
        }
    }

    for (i, target_row) in target.iter().enumerate() {
        let id = &target_ids[i];
        // Only first occurrences are indexed; duplicates never become Removed.
        if consumed[i] || target_index.get(id) != Some(&i) {
            continue;
        }
        diffs.push(RowDiff::Removed {
            primary_key: id.clone(),
            target_row: target_row.clone(),
        });
    }

    Ok(diffs)
}

/// Columns whose normalised values differ, source columns first (in source
/// order) followed by columns only the target row has. A column absent on one
/// side compares as `NULL`.
fn diff_columns(source: &RowData, target: &RowData) -> Vec<ColumnChange> {
    let columns = source
        .keys()
        .chain(target.keys().filter(|k| !source.contains_key(*k)));

    columns
        .filter_map(|col| {
            let s = source.get(col);
            let t = target.get(col);
            if normalize_cell(s) == normalize_cell(t) {
                return None;
            }
            Some(ColumnChange {
                column_name: col.clone(),
                source_value: s.cloned().unwrap_or(CellValue::Null),
                target_value: t.cloned().unwrap_or(CellValue::Null),
            })
        })
        .collect()
}

// ─── Table Differ (implementation of the port) ───

#[derive(Default)]
pub struct TableDiffer;

impl TableDiffer {
    pub fn new() -> Self {
        Self
    }
}

impl Differ for TableDiffer {
    fn compare_table(
        &self,
        source_table: &TableRef,
        target_table: &TableRef,
        source: &[RowData],
        target: &[RowData],
        pk_cols: &[ColumnName],
    ) -> Result<TableComparisonResult, CompareError> {
        let row_diffs = diff_rows(source, target, pk_cols)?;
        Ok(TableComparisonResult::new(
            source_table,
            target_table,
            pk_cols.iter().map(|c| c.0.clone()).collect(),
            row_diffs,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::DiffType;
    use serde_json::{json, Value};

    fn rows(v: Value) -> Vec<RowData> {
        serde_json::from_value(v).unwrap()
    }

    fn pk(names: &[&str]) -> Vec<ColumnName> {
        ColumnName::list(names)
    }

    fn kinds(diffs: &[RowDiff]) -> Vec<DiffType> {
        diffs.iter().map(RowDiff::diff_type).collect()
    }

    fn keys(diffs: &[RowDiff]) -> Vec<Value> {
        diffs
            .iter()
            .map(|d| serde_json::to_value(d.primary_key()).unwrap())
            .collect()
    }

    // ── diff_columns ──

    #[test]
    fn test_diff_columns_no_change() {
        let r = &rows(json!([{"id": 1, "val": "same"}]))[0];
        assert!(diff_columns(r, r).is_empty());
    }

    #[test]
    fn test_diff_columns_one_change() {
        let s = &rows(json!([{"id": 1, "val": "new"}]))[0];
        let t = &rows(json!([{"id": 1, "val": "old"}]))[0];
        let changes = diff_columns(s, t);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].column_name, "val");
        assert_eq!(changes[0].source_value, CellValue::text("new"));
        assert_eq!(changes[0].target_value, CellValue::text("old"));
    }

    #[test]
    fn test_diff_columns_missing_column_is_null() {
        let s = &rows(json!([{"id": 1, "note": null}]))[0];
        let t = &rows(json!([{"id": 1}]))[0];
        assert!(diff_columns(s, t).is_empty());

        let t2 = &rows(json!([{"id": 1, "extra": 5}]))[0];
        let changes = diff_columns(s, t2);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].column_name, "extra");
        assert!(changes[0].source_value.is_null());
    }

    #[test]
    fn test_diff_columns_integral_real_equals_integer() {
        let s = &rows(json!([{"id": 1, "qty": 2.0}]))[0];
        let t = &rows(json!([{"id": 1, "qty": 2}]))[0];
        assert!(diff_columns(s, t).is_empty());
    }

    #[test]
    fn test_diff_columns_numeric_text_differs_from_number() {
        let s = &rows(json!([{"id": 1, "code": "1"}]))[0];
        let t = &rows(json!([{"id": 1, "code": 1}]))[0];
        assert_eq!(diff_columns(s, t).len(), 1);
    }

    // ── diff_rows ──

    #[test]
    fn detects_added_modified_removed_in_order() {
        let source = rows(json!([{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]));
        let target = rows(json!([{"id": 2, "name": "B2"}, {"id": 3, "name": "C"}]));

        let diffs = diff_rows(&source, &target, &pk(&["id"])).unwrap();

        assert_eq!(kinds(&diffs), [DiffType::Added, DiffType::Modified, DiffType::Removed]);
        assert_eq!(keys(&diffs), [json!([1]), json!([2]), json!([3])]);

        let changes = diffs[1].column_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].column_name, "name");
        assert_eq!(changes[0].source_value, CellValue::text("B"));
        assert_eq!(changes[0].target_value, CellValue::text("B2"));
    }

    #[test]
    fn identical_sets_are_all_unchanged() {
        let data = rows(json!([{"id": 1, "x": 10}, {"id": 2, "x": 20}]));
        let diffs = diff_rows(&data, &data, &pk(&["id"])).unwrap();
        assert_eq!(diffs.len(), 2);
        assert!(diffs.iter().all(|d| d.diff_type() == DiffType::Unchanged));
    }

    #[test]
    fn swapping_sides_swaps_added_and_removed() {
        let a = rows(json!([{"id": 1, "v": "a"}, {"id": 2, "v": "x"}]));
        let b = rows(json!([{"id": 2, "v": "y"}, {"id": 3, "v": "c"}]));

        let ab = diff_rows(&a, &b, &pk(&["id"])).unwrap();
        let ba = diff_rows(&b, &a, &pk(&["id"])).unwrap();

        let added = |ds: &[RowDiff]| {
            ds.iter()
                .filter(|d| d.diff_type() == DiffType::Added)
                .map(|d| d.primary_key().clone())
                .collect::<Vec<_>>()
        };
        let removed = |ds: &[RowDiff]| {
            ds.iter()
                .filter(|d| d.diff_type() == DiffType::Removed)
                .map(|d| d.primary_key().clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(added(&ab), removed(&ba));
        assert_eq!(removed(&ab), added(&ba));

        let m_ab = &ab.iter().find(|d| d.diff_type() == DiffType::Modified).unwrap();
        let m_ba = &ba.iter().find(|d| d.diff_type() == DiffType::Modified).unwrap();
        assert_eq!(m_ab.column_changes()[0].source_value, m_ba.column_changes()[0].target_value);
    }

    #[test]
    fn every_identity_appears_exactly_once() {
        let source = rows(json!([{"id": 1}, {"id": 2}, {"id": 4}]));
        let target = rows(json!([{"id": 2}, {"id": 3}, {"id": 4}]));
        let diffs = diff_rows(&source, &target, &pk(&["id"])).unwrap();

        let mut seen = keys(&diffs);
        seen.sort_by_key(|v| v[0].as_i64());
        assert_eq!(seen, [json!([1]), json!([2]), json!([3]), json!([4])]);
    }

    #[test]
    fn composite_key_ignores_column_order_of_rows() {
        let source = rows(json!([{"region": "FR", "cat": "books", "rate": 5}]));
        let target = rows(json!([{"rate": 7, "cat": "books", "region": "FR"}]));
        let diffs = diff_rows(&source, &target, &pk(&["region", "cat"])).unwrap();
        assert_eq!(kinds(&diffs), [DiffType::Modified]);
    }

    #[test]
    fn null_key_matches_null_key() {
        let source = rows(json!([{"id": null, "v": 1}]));
        let target = rows(json!([{"id": null, "v": 1}]));
        let diffs = diff_rows(&source, &target, &pk(&["id"])).unwrap();
        assert_eq!(kinds(&diffs), [DiffType::Unchanged]);
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let source = rows(json!([{"id": 1, "v": "a"}, {"id": 1, "v": "dup"}]));
        let target = rows(json!([{"id": 1, "v": "a"}, {"id": 1, "v": "other"}, {"id": 2, "v": "b"}]));
        let diffs = diff_rows(&source, &target, &pk(&["id"])).unwrap();
        assert_eq!(kinds(&diffs), [DiffType::Unchanged, DiffType::Removed]);
        assert_eq!(keys(&diffs), [json!([1]), json!([2])]);
    }

    #[test]
    fn empty_key_list_is_rejected() {
        let err = diff_rows(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, CompareError::InvalidComparisonConfig(_)));
    }

    #[test]
    fn missing_key_column_is_rejected() {
        let source = rows(json!([{"name": "x"}]));
        let err = diff_rows(&source, &[], &pk(&["id"])).unwrap_err();
        assert_eq!(err, CompareError::MissingKeyColumn("id".into()));
    }

    #[test]
    fn empty_inputs_produce_no_diffs() {
        assert!(diff_rows(&[], &[], &pk(&["id"])).unwrap().is_empty());
    }

    // ── TableDiffer ──

    #[test]
    fn table_differ_builds_summary() {
        let source = rows(json!([{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]));
        let target = rows(json!([{"id": 2, "name": "B2"}, {"id": 3, "name": "C"}]));
        let t = TableRef::main("t");

        let result = TableDiffer::new()
            .compare_table(&t, &t, &source, &target, &pk(&["id"]))
            .unwrap();

        assert_eq!(result.primary_keys, ["id"]);
        assert_eq!(result.source_table, "t");
        assert_eq!(result.target_schema, "main");
        let s = &result.summary;
        assert_eq!((s.added, s.removed, s.modified, s.unchanged, s.total), (1, 1, 1, 0, 3));
        assert!(result.has_changes());
    }
}
