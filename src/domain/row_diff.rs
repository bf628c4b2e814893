use serde::{Deserialize, Serialize};

use crate::domain::row_identity::RowIdentity;
use crate::domain::value::{CellValue, RowData};
use crate::domain::value_objects::{DiffType, TableRef};

/// One column that differs between the source and target versions of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChange {
    pub column_name: String,
    pub source_value: CellValue,
    pub target_value: CellValue,
}

/// The comparison outcome for one row identity.
///
/// Each variant carries only the fields valid for that state, so e.g. a
/// `Removed` row can never hold column changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "diffType",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum RowDiff {
    /// Present in source only; becomes an INSERT into target.
    Added {
        primary_key: RowIdentity,
        source_row: RowData,
    },
    /// Present in target only; becomes a DELETE when deletes are requested.
    Removed {
        primary_key: RowIdentity,
        target_row: RowData,
    },
    /// Present on both sides with at least one differing column.
    Modified {
        primary_key: RowIdentity,
        source_row: RowData,
        target_row: RowData,
        column_changes: Vec<ColumnChange>,
    },
    Unchanged {
        primary_key: RowIdentity,
        source_row: RowData,
        target_row: RowData,
    },
}

impl RowDiff {
    pub fn primary_key(&self) -> &RowIdentity {
        match self {
            RowDiff::Added { primary_key, .. }
            | RowDiff::Removed { primary_key, .. }
            | RowDiff::Modified { primary_key, .. }
            | RowDiff::Unchanged { primary_key, .. } => primary_key,
        }
    }

    pub fn diff_type(&self) -> DiffType {
        match self {
            RowDiff::Added { .. } => DiffType::Added,
            RowDiff::Removed { .. } => DiffType::Removed,
            RowDiff::Modified { .. } => DiffType::Modified,
            RowDiff::Unchanged { .. } => DiffType::Unchanged,
        }
    }

    pub fn source_row(&self) -> Option<&RowData> {
        match self {
            RowDiff::Added { source_row, .. }
            | RowDiff::Modified { source_row, .. }
            | RowDiff::Unchanged { source_row, .. } => Some(source_row),
            RowDiff::Removed { .. } => None,
        }
    }

    pub fn target_row(&self) -> Option<&RowData> {
        match self {
            RowDiff::Removed { target_row, .. }
            | RowDiff::Modified { target_row, .. }
            | RowDiff::Unchanged { target_row, .. } => Some(target_row),
            RowDiff::Added { .. } => None,
        }
    }

    /// Column-level changes; empty for every variant but `Modified`.
    pub fn column_changes(&self) -> &[ColumnChange] {
        match self {
            RowDiff::Modified { column_changes, .. } => column_changes,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    pub total: usize,
}

impl ComparisonSummary {
    pub fn from_diffs(diffs: &[RowDiff]) -> Self {
        let mut s = ComparisonSummary::default();
        for d in diffs {
            match d.diff_type() {
                DiffType::Added => s.added += 1,
                DiffType::Removed => s.removed += 1,
                DiffType::Modified => s.modified += 1,
                DiffType::Unchanged => s.unchanged += 1,
            }
        }
        s.total = diffs.len();
        s
    }

    /// Number of rows that would need a statement to reconcile.
    pub fn changes(&self) -> usize {
        self.added + self.removed + self.modified
    }
}

/// The full row-level comparison of one source table against one target table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableComparisonResult {
    pub source_table: String,
    pub target_table: String,
    pub source_schema: String,
    pub target_schema: String,
    pub primary_keys: Vec<String>,
    pub row_diffs: Vec<RowDiff>,
    pub summary: ComparisonSummary,
}

impl TableComparisonResult {
    pub fn new(
        source: &TableRef,
        target: &TableRef,
        primary_keys: Vec<String>,
        row_diffs: Vec<RowDiff>,
    ) -> Self {
        let summary = ComparisonSummary::from_diffs(&row_diffs);
        Self {
            source_table: source.name.0.clone(),
            target_table: target.name.0.clone(),
            source_schema: source.schema.0.clone(),
            target_schema: target.schema.0.clone(),
            primary_keys,
            row_diffs,
            summary,
        }
    }

    pub fn diffs_of(&self, kind: DiffType) -> impl Iterator<Item = &RowDiff> {
        self.row_diffs.iter().filter(move |d| d.diff_type() == kind)
    }

    pub fn has_changes(&self) -> bool {
        self.summary.changes() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: serde_json::Value) -> RowData {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn serializes_with_diff_type_discriminant() {
        let d = RowDiff::Modified {
            primary_key: RowIdentity::from_values(vec![CellValue::Integer(2)]),
            source_row: row(json!({"id": 2, "name": "B"})),
            target_row: row(json!({"id": 2, "name": "B2"})),
            column_changes: vec![ColumnChange {
                column_name: "name".into(),
                source_value: CellValue::text("B"),
                target_value: CellValue::text("B2"),
            }],
        };
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["diffType"], "modified");
        assert_eq!(v["primaryKey"], json!([2]));
        assert_eq!(v["columnChanges"][0]["columnName"], "name");
        assert_eq!(v["columnChanges"][0]["targetValue"], "B2");

        let back: RowDiff = serde_json::from_value(v).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn accessors_follow_variant() {
        let d = RowDiff::Removed {
            primary_key: RowIdentity::from_values(vec![CellValue::Integer(3)]),
            target_row: row(json!({"id": 3})),
        };
        assert_eq!(d.diff_type(), DiffType::Removed);
        assert!(d.source_row().is_none());
        assert!(d.target_row().is_some());
        assert!(d.column_changes().is_empty());
    }

    #[test]
    fn summary_counts_each_kind() {
        let pk = |i| RowIdentity::from_values(vec![CellValue::Integer(i)]);
        let diffs = vec![
            RowDiff::Added {
                primary_key: pk(1),
                source_row: row(json!({"id": 1})),
            },
            RowDiff::Unchanged {
                primary_key: pk(2),
                source_row: row(json!({"id": 2})),
                target_row: row(json!({"id": 2})),
            },
            RowDiff::Removed {
                primary_key: pk(3),
                target_row: row(json!({"id": 3})),
            },
        ];
        let s = ComparisonSummary::from_diffs(&diffs);
        assert_eq!((s.added, s.removed, s.modified, s.unchanged, s.total), (1, 1, 0, 1, 3));
        assert_eq!(s.changes(), 2);
    }
}
