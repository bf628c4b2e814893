//! Schema diff data structures
//!
//! Structural differences between two schema descriptions: per table, and per
//! column, index, foreign key and trigger within a table.

use serde::{Deserialize, Serialize};

use crate::domain::schema::{
    ColumnSchema, ForeignKeySchema, IndexSchema, TableSchema, TriggerSchema,
};
use crate::domain::value_objects::{DiffType, SourceKind};

/// A single field that differs: `from` is the target's current value, `to` the
/// source's value the target would migrate to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange<T> {
    pub from: T,
    pub to: T,
}

impl<T: PartialEq + Clone> FieldChange<T> {
    /// `Some` only when the two values differ.
    pub fn between(target: &T, source: &T) -> Option<Self> {
        (target != source).then(|| FieldChange {
            from: target.clone(),
            to: source.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChanges {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<FieldChange<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldChange<Option<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key_position: Option<FieldChange<Option<u32>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<FieldChange<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<FieldChange<bool>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<FieldChange<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_columns: Option<FieldChange<Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<FieldChange<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<FieldChange<String>>,
}

/// A schema object matched by name across both sides.
pub trait SchemaObject: Clone {
    type Changes;

    fn name(&self) -> &str;

    /// Field-level differences from `target` to `self` (the source side);
    /// `None` when the compared fields are equal.
    fn changes_from(&self, target: &Self) -> Option<Self::Changes>;
}

/// Outcome of matching one named schema object across both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "diffType",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ObjectDiff<T, C> {
    Added {
        name: String,
        source: T,
    },
    Removed {
        name: String,
        target: T,
    },
    Modified {
        name: String,
        source: T,
        target: T,
        changes: C,
    },
    Unchanged {
        name: String,
        source: T,
        target: T,
    },
}

impl<T, C> ObjectDiff<T, C> {
    pub fn name(&self) -> &str {
        match self {
            ObjectDiff::Added { name, .. }
            | ObjectDiff::Removed { name, .. }
            | ObjectDiff::Modified { name, .. }
            | ObjectDiff::Unchanged { name, .. } => name,
        }
    }

    pub fn diff_type(&self) -> DiffType {
        match self {
            ObjectDiff::Added { .. } => DiffType::Added,
            ObjectDiff::Removed { .. } => DiffType::Removed,
            ObjectDiff::Modified { .. } => DiffType::Modified,
            ObjectDiff::Unchanged { .. } => DiffType::Unchanged,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, ObjectDiff::Unchanged { .. })
    }
}

pub type ColumnDiff = ObjectDiff<ColumnSchema, ColumnChanges>;
pub type IndexDiff = ObjectDiff<IndexSchema, IndexChanges>;
pub type ForeignKeyDiff = ObjectDiff<ForeignKeySchema, ForeignKeyChanges>;
pub type TriggerDiff = ObjectDiff<TriggerSchema, TriggerChanges>;

/// Differences for one table.
///
/// The four sub-diff lists are populated only when `diff_type` is
/// [`DiffType::Modified`]; added and removed tables carry their full
/// structure in `source` / `target` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDiff {
    pub name: String,
    pub schema: String,
    pub diff_type: DiffType,
    pub source: Option<TableSchema>,
    pub target: Option<TableSchema>,
    #[serde(default)]
    pub column_diffs: Vec<ColumnDiff>,
    #[serde(default)]
    pub index_diffs: Vec<IndexDiff>,
    #[serde(default)]
    pub foreign_key_diffs: Vec<ForeignKeyDiff>,
    #[serde(default)]
    pub trigger_diffs: Vec<TriggerDiff>,
}

impl TableDiff {
    pub fn added(source: TableSchema) -> Self {
        Self::bare(&source, DiffType::Added, Some(source.clone()), None)
    }

    pub fn removed(target: TableSchema) -> Self {
        Self::bare(&target, DiffType::Removed, None, Some(target.clone()))
    }

    pub fn unchanged(source: TableSchema, target: TableSchema) -> Self {
        Self::bare(&source, DiffType::Unchanged, Some(source.clone()), Some(target))
    }

    fn bare(
        named: &TableSchema,
        diff_type: DiffType,
        source: Option<TableSchema>,
        target: Option<TableSchema>,
    ) -> Self {
        Self {
            name: named.name.clone(),
            schema: named.schema.clone(),
            diff_type,
            source,
            target,
            column_diffs: Vec::new(),
            index_diffs: Vec::new(),
            foreign_key_diffs: Vec::new(),
            trigger_diffs: Vec::new(),
        }
    }

    /// Returns the qualified table name (schema.table)
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Number of sub-objects that are not unchanged.
    pub fn change_count(&self) -> usize {
        self.column_diffs.iter().filter(|d| !d.is_unchanged()).count()
            + self.index_diffs.iter().filter(|d| !d.is_unchanged()).count()
            + self.foreign_key_diffs.iter().filter(|d| !d.is_unchanged()).count()
            + self.trigger_diffs.iter().filter(|d| !d.is_unchanged()).count()
    }
}

/// Identifies one side of a schema comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaEndpoint {
    pub id: String,
    pub label: String,
    pub kind: SourceKind,
}

impl SchemaEndpoint {
    pub fn connection(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: SourceKind::Connection,
        }
    }

    pub fn snapshot(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: SourceKind::Snapshot,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl SchemaSummary {
    pub fn from_diffs(diffs: &[TableDiff]) -> Self {
        let mut s = SchemaSummary::default();
        for d in diffs {
            match d.diff_type {
                DiffType::Added => s.added += 1,
                DiffType::Removed => s.removed += 1,
                DiffType::Modified => s.modified += 1,
                DiffType::Unchanged => s.unchanged += 1,
            }
        }
        s
    }

    pub fn is_identical(&self) -> bool {
        self.added + self.removed + self.modified == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaComparisonResult {
    pub source_id: String,
    pub source_label: String,
    pub source_kind: SourceKind,
    pub target_id: String,
    pub target_label: String,
    pub target_kind: SourceKind,
    pub table_diffs: Vec<TableDiff>,
    pub summary: SchemaSummary,
}

impl SchemaComparisonResult {
    pub fn new(source: &SchemaEndpoint, target: &SchemaEndpoint, table_diffs: Vec<TableDiff>) -> Self {
        let summary = SchemaSummary::from_diffs(&table_diffs);
        Self {
            source_id: source.id.clone(),
            source_label: source.label.clone(),
            source_kind: source.kind,
            target_id: target.id.clone(),
            target_label: target.label.clone(),
            target_kind: target.kind,
            table_diffs,
            summary,
        }
    }
}
