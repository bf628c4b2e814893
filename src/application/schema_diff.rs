//! Schema object differencer
//!
//! Tables are matched on exact `(schema, name)`; inside a matched table,
//! columns, indexes, foreign keys and triggers are matched by name. A rename
//! therefore shows up as one `Removed` plus one `Added`.

use std::fmt::Debug;
use std::hash::Hash;

use indexmap::{map::Entry, IndexMap};
use tracing::{info, warn};

use crate::domain::{
    schema::{ColumnSchema, ForeignKeySchema, IndexSchema, TableSchema, TriggerSchema},
    schema_diff::{
        ColumnChanges, FieldChange, ForeignKeyChanges, IndexChanges, ObjectDiff,
        SchemaComparisonResult, SchemaEndpoint, SchemaObject, TableDiff, TriggerChanges,
    },
    value_objects::DiffType,
};

// ─── Per-object field comparison ───

impl SchemaObject for ColumnSchema {
    type Changes = ColumnChanges;

    fn name(&self) -> &str {
        &self.name
    }

    fn changes_from(&self, target: &Self) -> Option<ColumnChanges> {
        let c = ColumnChanges {
            data_type: FieldChange::between(&target.data_type, &self.data_type),
            nullable: FieldChange::between(&target.nullable, &self.nullable),
            default_value: FieldChange::between(&target.default_value, &self.default_value),
            primary_key_position: FieldChange::between(
                &target.primary_key_position,
                &self.primary_key_position,
            ),
        };
        (c != ColumnChanges::default()).then_some(c)
    }
}

impl SchemaObject for IndexSchema {
    type Changes = IndexChanges;

    fn name(&self) -> &str {
        &self.name
    }

    fn changes_from(&self, target: &Self) -> Option<IndexChanges> {
        let c = IndexChanges {
            columns: FieldChange::between(&target.columns, &self.columns),
            unique: FieldChange::between(&target.unique, &self.unique),
        };
        (c != IndexChanges::default()).then_some(c)
    }
}

impl SchemaObject for ForeignKeySchema {
    type Changes = ForeignKeyChanges;

    fn name(&self) -> &str {
        &self.name
    }

    fn changes_from(&self, target: &Self) -> Option<ForeignKeyChanges> {
        let c = ForeignKeyChanges {
            columns: FieldChange::between(&target.columns, &self.columns),
            referenced_table: FieldChange::between(&target.referenced_table, &self.referenced_table),
            referenced_columns: FieldChange::between(&target.referenced_columns, &self.referenced_columns),
            on_delete: FieldChange::between(&target.on_delete, &self.on_delete),
            on_update: FieldChange::between(&target.on_update, &self.on_update),
        };
        (c != ForeignKeyChanges::default()).then_some(c)
    }
}

impl SchemaObject for TriggerSchema {
    type Changes = TriggerChanges;

    fn name(&self) -> &str {
        &self.name
    }

    /// The trigger body is compared as an opaque string.
    fn changes_from(&self, target: &Self) -> Option<TriggerChanges> {
        let c = TriggerChanges {
            timing: FieldChange::between(&target.timing, &self.timing),
            event: FieldChange::between(&target.event, &self.event),
            sql: FieldChange::between(&target.sql, &self.sql),
        };
        (c != TriggerChanges::default()).then_some(c)
    }
}

/// Index `items` by key, keeping the first occurrence of each key in input
/// order. Later duplicates are dropped with a warning.
fn first_by_key<'a, T, K>(items: &'a [T], side: &str, key: impl Fn(&T) -> K) -> IndexMap<K, &'a T>
where
    K: Hash + Eq + Debug,
{
    let mut map = IndexMap::with_capacity(items.len());
    for item in items {
        match map.entry(key(item)) {
            Entry::Occupied(e) => {
                warn!(side, name = ?e.key(), "duplicate schema object name, keeping first");
            }
            Entry::Vacant(e) => {
                e.insert(item);
            }
        }
    }
    map
}

/// Match two object lists by name: source order first, then target-only
/// objects in target order. Each name yields exactly one diff.
pub fn diff_by_name<T: SchemaObject>(source: &[T], target: &[T]) -> Vec<ObjectDiff<T, T::Changes>> {
    let source_by_name = first_by_key(source, "source", |s| s.name().to_string());
    let target_by_name = first_by_key(target, "target", |t| t.name().to_string());

    let mut diffs = Vec::with_capacity(source_by_name.len().max(target_by_name.len()));

    for (name, s) in &source_by_name {
        let name = name.clone();
        let diff = match target_by_name.get(&name) {
            None => ObjectDiff::Added {
                name,
                source: (*s).clone(),
            },
            Some(t) => match s.changes_from(t) {
                Some(changes) => ObjectDiff::Modified {
                    name,
                    source: (*s).clone(),
                    target: (*t).clone(),
                    changes,
                },
                None => ObjectDiff::Unchanged {
                    name,
                    source: (*s).clone(),
                    target: (*t).clone(),
                },
            },
        };
        diffs.push(diff);
    }

    for (name, t) in target_by_name.iter().filter(|(n, _)| !source_by_name.contains_key(*n)) {
        diffs.push(ObjectDiff::Removed {
            name: name.clone(),
            target: (*t).clone(),
        });
    }

    diffs
}

// ─── Table comparison ───

/// Compare two matched tables. Yields an `Unchanged` diff with empty
/// sub-diff lists when nothing differs.
pub fn compare_table(source: &TableSchema, target: &TableSchema) -> TableDiff {
    let column_diffs = diff_by_name(&source.columns, &target.columns);
    let index_diffs = diff_by_name(&source.indexes, &target.indexes);
    let foreign_key_diffs = diff_by_name(&source.foreign_keys, &target.foreign_keys);
    let trigger_diffs = diff_by_name(&source.triggers, &target.triggers);

    let any_change = column_diffs.iter().any(|d| !d.is_unchanged())
        || index_diffs.iter().any(|d| !d.is_unchanged())
        || foreign_key_diffs.iter().any(|d| !d.is_unchanged())
        || trigger_diffs.iter().any(|d| !d.is_unchanged());

    if !any_change {
        return TableDiff::unchanged(source.clone(), target.clone());
    }

    TableDiff {
        name: source.name.clone(),
        schema: source.schema.clone(),
        diff_type: DiffType::Modified,
        source: Some(source.clone()),
        target: Some(target.clone()),
        column_diffs,
        index_diffs,
        foreign_key_diffs,
        trigger_diffs,
    }
}

fn table_key(t: &TableSchema) -> (String, String) {
    (t.schema.clone(), t.name.clone())
}

/// Compare two table lists.
///
/// Output order: source tables in source order, then target-only tables in
/// target order.
pub fn compare_schemas(
    source_tables: &[TableSchema],
    target_tables: &[TableSchema],
    source: &SchemaEndpoint,
    target: &SchemaEndpoint,
) -> SchemaComparisonResult {
    let source_by_key = first_by_key(source_tables, "source", table_key);
    let target_by_key = first_by_key(target_tables, "target", table_key);

    let mut table_diffs = Vec::with_capacity(source_by_key.len().max(target_by_key.len()));

    for (key, s) in &source_by_key {
        let diff = match target_by_key.get(key) {
            None => TableDiff::added((*s).clone()),
            Some(t) => compare_table(s, t),
        };
        table_diffs.push(diff);
    }

    for (_, t) in target_by_key.iter().filter(|(k, _)| !source_by_key.contains_key(*k)) {
        table_diffs.push(TableDiff::removed((*t).clone()));
    }

    let result = SchemaComparisonResult::new(source, target, table_diffs);
    info!(
        source = %source.label,
        target = %target.label,
        added = result.summary.added,
        removed = result.summary.removed,
        modified = result.summary.modified,
        unchanged = result.summary.unchanged,
        "schema comparison completed"
    );
    result
}
