//! Migration SQL generator (SQLite / SQLCipher DDL)
//!
//! Turns a [`SchemaComparisonResult`] into DDL that moves the target schema
//! to the source schema. SQLite's `ALTER TABLE` only supports adding,
//! dropping and renaming columns, so every other structural change is
//! reported as a warning naming the table instead of being emitted.

use tracing::info;

use crate::domain::{
    dialect::{QueryDialect, SqliteDialect},
    error::GenerationError,
    schema::{ColumnSchema, ForeignKeySchema, IndexSchema, TableSchema, TriggerSchema},
    schema_diff::{ColumnChanges, ObjectDiff, SchemaComparisonResult, TableDiff},
    sync::GeneratedSql,
    value_objects::DiffType,
};

/// Statements bucketed by execution phase; flattened in declaration order.
#[derive(Default)]
struct Phases {
    drop_triggers: Vec<String>,
    drop_indexes: Vec<String>,
    drop_tables: Vec<String>,
    create_tables: Vec<String>,
    alter_columns: Vec<String>,
    create_indexes: Vec<String>,
    create_triggers: Vec<String>,
    warnings: Vec<String>,
}

impl Phases {
    fn into_generated(self) -> GeneratedSql {
        let statements: Vec<String> = [
            self.drop_triggers,
            self.drop_indexes,
            self.drop_tables,
            self.create_tables,
            self.alter_columns,
            self.create_indexes,
            self.create_triggers,
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut warnings = self.warnings;
        if statements.is_empty() {
            warnings.push(
                "No SQL statements were generated. The schemas have no differences that \
                 can be applied with DDL."
                    .to_string(),
            );
        }
        GeneratedSql::new(statements, warnings)
    }
}

pub struct MigrationGenerator {
    dialect: Box<dyn QueryDialect>,
}

impl Default for MigrationGenerator {
    fn default() -> Self {
        Self::new(Box::new(SqliteDialect))
    }
}

impl MigrationGenerator {
    pub fn new(dialect: Box<dyn QueryDialect>) -> Self {
        Self { dialect }
    }

    pub fn generate(&self, result: &SchemaComparisonResult) -> Result<GeneratedSql, GenerationError> {
        for diff in &result.table_diffs {
            validate(diff)?;
        }

        let mut p = Phases::default();
        for diff in &result.table_diffs {
            match diff.diff_type {
                DiffType::Unchanged => {}
                DiffType::Removed => self.plan_removed(diff, &mut p),
                DiffType::Added => self.plan_added(diff, &mut p),
                DiffType::Modified => self.plan_modified(diff, &mut p),
            }
        }

        let out = p.into_generated();
        info!(
            dialect = self.dialect.name(),
            source = %result.source_label,
            target = %result.target_label,
            statements = out.statements.len(),
            warnings = out.warnings.len(),
            "migration SQL generated"
        );
        Ok(out)
    }

    fn table_name(&self, diff: &TableDiff) -> String {
        self.dialect.qualified(&diff.schema, &diff.name)
    }

    // ─── Removed tables ───

    fn plan_removed(&self, diff: &TableDiff, p: &mut Phases) {
        let table = self.table_name(diff);
        // Dropping the table also drops its indexes and triggers.
        p.drop_tables.push(format!("DROP TABLE IF EXISTS {};", table));
        p.warnings.push(format!(
            "Table {} will be dropped. All of its data will be lost.",
            table
        ));
    }

    // ─── Added tables ───

    fn plan_added(&self, diff: &TableDiff, p: &mut Phases) {
        let Some(source) = &diff.source else { return };
        p.create_tables.push(self.create_table(source));
        for index in &source.indexes {
            p.create_tables.push(self.create_index(&source.schema, &source.name, index));
        }
        for trigger in &source.triggers {
            p.create_tables.push(self.create_trigger(trigger));
        }
    }

    fn create_table(&self, table: &TableSchema) -> String {
        let pk_cols = table.primary_key_columns();
        let inline_pk = pk_cols.len() == 1;

        let mut defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_definition(c, inline_pk && c.is_primary_key()))
            .collect();

        if pk_cols.len() > 1 {
            let cols: Vec<String> = pk_cols.iter().map(|c| self.dialect.quote_ident(c)).collect();
            defs.push(format!("PRIMARY KEY ({})", cols.join(", ")));
        }
        for fk in &table.foreign_keys {
            defs.push(self.foreign_key_clause(fk));
        }

        format!(
            "CREATE TABLE {} (\n  {}\n);",
            self.dialect.qualified(&table.schema, &table.name),
            defs.join(",\n  ")
        )
    }

    fn column_definition(&self, col: &ColumnSchema, primary_key: bool) -> String {
        let mut def = self.dialect.quote_ident(&col.name);
        if !col.data_type.is_empty() {
            def.push(' ');
            def.push_str(&col.data_type);
        }
        if primary_key {
            def.push_str(" PRIMARY KEY");
        }
        if !col.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &col.default_value {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        def
    }

    fn ident_list(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|n| self.dialect.quote_ident(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn foreign_key_clause(&self, fk: &ForeignKeySchema) -> String {
        let mut clause = format!(
            "FOREIGN KEY ({}) REFERENCES {}",
            self.ident_list(&fk.columns),
            self.dialect.quote_ident(&fk.referenced_table)
        );
        if !fk.referenced_columns.is_empty() {
            clause.push_str(&format!(" ({})", self.ident_list(&fk.referenced_columns)));
        }
        for (verb, action) in [("DELETE", &fk.on_delete), ("UPDATE", &fk.on_update)] {
            if !action.is_empty() && !action.eq_ignore_ascii_case("NO ACTION") {
                clause.push_str(&format!(" ON {} {}", verb, action));
            }
        }
        clause
    }

    fn create_index(&self, schema: &str, table: &str, index: &IndexSchema) -> String {
        // The index name carries the schema; the table must stay unqualified.
        format!(
            "CREATE {}INDEX {} ON {} ({});",
            if index.unique { "UNIQUE " } else { "" },
            self.dialect.qualified(schema, &index.name),
            self.dialect.quote_ident(table),
            self.ident_list(&index.columns)
        )
    }

    fn create_trigger(&self, trigger: &TriggerSchema) -> String {
        let sql = trigger.sql.trim_end();
        if sql.ends_with(';') {
            sql.to_string()
        } else {
            format!("{};", sql)
        }
    }

    // ─── Modified tables ───

    fn plan_modified(&self, diff: &TableDiff, p: &mut Phases) {
        let table = self.table_name(diff);

        for d in &diff.trigger_diffs {
            match d {
                ObjectDiff::Removed { target, .. } | ObjectDiff::Modified { target, .. } => {
                    p.drop_triggers.push(format!(
                        "DROP TRIGGER IF EXISTS {};",
                        self.dialect.qualified(&diff.schema, &target.name)
                    ));
                }
                _ => {}
            }
            match d {
                ObjectDiff::Added { source, .. } | ObjectDiff::Modified { source, .. } => {
                    p.create_triggers.push(self.create_trigger(source));
                }
                _ => {}
            }
        }

        for d in &diff.index_diffs {
            match d {
                ObjectDiff::Removed { target, .. } | ObjectDiff::Modified { target, .. } => {
                    p.drop_indexes.push(format!(
                        "DROP INDEX IF EXISTS {};",
                        self.dialect.qualified(&diff.schema, &target.name)
                    ));
                }
                _ => {}
            }
            match d {
                ObjectDiff::Added { source, .. } | ObjectDiff::Modified { source, .. } => {
                    p.create_indexes.push(self.create_index(&diff.schema, &diff.name, source));
                }
                _ => {}
            }
        }

        for d in &diff.column_diffs {
            match d {
                ObjectDiff::Added { source, .. } => self.plan_add_column(&table, source, p),
                ObjectDiff::Removed { target, .. } => self.plan_drop_column(&table, target, p),
                ObjectDiff::Modified { name, changes, .. } => {
                    p.warnings.push(format!(
                        "Column {} on table {} changed ({}). SQLite cannot alter an existing \
                         column; rebuild the table to apply this change.",
                        self.dialect.quote_ident(name),
                        table,
                        describe_column_changes(changes)
                    ));
                }
                ObjectDiff::Unchanged { .. } => {}
            }
        }

        for d in &diff.foreign_key_diffs {
            let verb = match d.diff_type() {
                DiffType::Added => "was added",
                DiffType::Removed => "was removed",
                DiffType::Modified => "changed",
                DiffType::Unchanged => continue,
            };
            p.warnings.push(format!(
                "Foreign key {} on table {} {}. SQLite cannot alter foreign keys; rebuild the \
                 table to apply this change.",
                d.name(),
                table,
                verb
            ));
        }
    }

    fn plan_add_column(&self, table: &str, col: &ColumnSchema, p: &mut Phases) {
        let col_q = self.dialect.quote_ident(&col.name);
        if col.is_primary_key() {
            p.warnings.push(format!(
                "Column {} on table {} is part of the primary key. SQLite cannot add a PRIMARY \
                 KEY column with ALTER TABLE; rebuild the table to apply this change.",
                col_q, table
            ));
            return;
        }

        p.alter_columns.push(format!(
            "ALTER TABLE {} ADD COLUMN {};",
            table,
            self.column_definition(col, false)
        ));
        if !col.nullable && col.default_value.is_none() {
            p.warnings.push(format!(
                "Column {} on table {} is NOT NULL without a default. ADD COLUMN fails if the \
                 table already contains rows.",
                col_q, table
            ));
        }
    }

    fn plan_drop_column(&self, table: &str, col: &ColumnSchema, p: &mut Phases) {
        let col_q = self.dialect.quote_ident(&col.name);
        if col.is_primary_key() {
            p.warnings.push(format!(
                "Column {} on table {} is part of the primary key. SQLite cannot drop it with \
                 ALTER TABLE; rebuild the table to apply this change.",
                col_q, table
            ));
            return;
        }

        p.alter_columns.push(format!("ALTER TABLE {} DROP COLUMN {};", table, col_q));
        p.warnings.push(format!(
            "Column {} will be dropped from table {}. Its data will be lost.",
            col_q, table
        ));
    }
}

/// Generate migration SQL with the SQLite dialect.
pub fn generate_migration_sql(result: &SchemaComparisonResult) -> Result<GeneratedSql, GenerationError> {
    MigrationGenerator::default().generate(result)
}

fn describe_column_changes(c: &ColumnChanges) -> String {
    let mut parts = Vec::new();
    if let Some(ch) = &c.data_type {
        parts.push(format!("type {} -> {}", display_type(&ch.from), display_type(&ch.to)));
    }
    if let Some(ch) = &c.nullable {
        parts.push(format!("nullable {} -> {}", ch.from, ch.to));
    }
    if let Some(ch) = &c.default_value {
        parts.push(format!(
            "default {} -> {}",
            ch.from.as_deref().unwrap_or("none"),
            ch.to.as_deref().unwrap_or("none")
        ));
    }
    if let Some(ch) = &c.primary_key_position {
        parts.push(format!(
            "primary key position {} -> {}",
            key_position(ch.from),
            key_position(ch.to)
        ));
    }
    parts.join(", ")
}

fn key_position(pos: Option<u32>) -> String {
    pos.map_or_else(|| "none".to_string(), |p| p.to_string())
}

fn display_type(t: &str) -> &str {
    if t.is_empty() {
        "(none)"
    } else {
        t
    }
}

fn validate(diff: &TableDiff) -> Result<(), GenerationError> {
    let malformed = |reason: &str| GenerationError::MalformedTableDiff {
        table: diff.qualified_name(),
        reason: reason.to_string(),
    };

    match diff.diff_type {
        DiffType::Added => {
            let source = diff.source.as_ref().ok_or_else(|| malformed("added table has no source definition"))?;
            if source.columns.is_empty() {
                return Err(malformed("added table has no columns"));
            }
        }
        DiffType::Removed => {
            if diff.target.is_none() {
                return Err(malformed("removed table has no target definition"));
            }
        }
        DiffType::Modified => {
            if diff.source.is_none() || diff.target.is_none() {
                return Err(malformed("modified table must carry both definitions"));
            }
            if diff.change_count() == 0 {
                return Err(malformed("modified table has no changed objects"));
            }
        }
        DiffType::Unchanged => {}
    }
    Ok(())
}
