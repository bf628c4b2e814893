use std::fmt::Write as FmtWrite;

use anyhow::Result;

use crate::domain::{ports::OutputWriter, report::Report};

/// A runnable script: header comments, warnings as comments, then every
/// statement inside one transaction.
pub struct SqlWriter;

impl OutputWriter for SqlWriter {
    fn format(&self, report: &Report<'_>) -> Result<String> {
        let generated = report.sql();
        let mut sql = String::new();

        writeln!(sql, "-- litediff: {}", report.title())?;
        writeln!(sql, "-- Generated: {}", chrono::Utc::now().to_rfc3339())?;
        match report {
            Report::Data { comparison, .. } => {
                let s = &comparison.summary;
                writeln!(
                    sql,
                    "-- Summary: {} added, {} modified, {} removed, {} unchanged",
                    s.added, s.modified, s.removed, s.unchanged
                )?;
            }
            Report::Schema { comparison, .. } => {
                let s = &comparison.summary;
                writeln!(
                    sql,
                    "-- Summary: {} tables added, {} modified, {} removed, {} unchanged",
                    s.added, s.modified, s.removed, s.unchanged
                )?;
            }
        }

        if !generated.warnings.is_empty() {
            writeln!(sql, "--")?;
            for warning in &generated.warnings {
                writeln!(sql, "-- WARNING: {}", warning)?;
            }
        }
        writeln!(sql)?;

        if generated.statements.is_empty() {
            return Ok(sql);
        }

        writeln!(sql, "BEGIN;")?;
        writeln!(sql)?;
        for stmt in &generated.statements {
            writeln!(sql, "{}", stmt)?;
            writeln!(sql)?;
        }
        writeln!(sql, "COMMIT;")?;
        Ok(sql)
    }

    fn extension(&self) -> &'static str {
        "sql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::migration::generate_migration_sql;
    use crate::application::schema_diff::compare_schemas;
    use crate::domain::schema::{ColumnSchema, TableSchema};
    use crate::domain::schema_diff::{SchemaComparisonResult, SchemaEndpoint};
    use crate::domain::row_diff::TableComparisonResult;
    use crate::domain::sync::GeneratedSql;
    use crate::domain::value_objects::TableRef;

    fn migration_report() -> (SchemaComparisonResult, GeneratedSql) {
        let users = TableSchema::new("main", "users", vec![ColumnSchema::new("id", "INTEGER").primary_key()]);
        let legacy = TableSchema::new("main", "legacy", vec![ColumnSchema::new("id", "INTEGER")]);
        let cmp = compare_schemas(
            &[users],
            &[legacy],
            &SchemaEndpoint::connection("dev", "dev"),
            &SchemaEndpoint::connection("prod", "prod"),
        );
        let sql = generate_migration_sql(&cmp).unwrap();
        (cmp, sql)
    }

    #[test]
    fn script_wraps_statements_in_a_transaction() {
        let (cmp, generated) = migration_report();
        let out = SqlWriter
            .format(&Report::Schema { comparison: &cmp, sql: &generated })
            .unwrap();

        assert!(out.starts_with("-- litediff: schema migration dev (connection) -> prod (connection)"));
        assert!(out.contains("-- Summary: 1 tables added, 0 modified, 1 removed, 0 unchanged"));
        assert!(out.contains("-- WARNING: Table legacy will be dropped."));

        let begin = out.find("BEGIN;").unwrap();
        let drop = out.find("DROP TABLE IF EXISTS legacy;").unwrap();
        let create = out.find("CREATE TABLE users").unwrap();
        let commit = out.find("COMMIT;").unwrap();
        assert!(begin < drop && drop < create && create < commit);
    }

    #[test]
    fn empty_script_has_no_transaction() {
        let t = TableRef::main("t");
        let cmp = TableComparisonResult::new(&t, &t, vec!["id".into()], vec![]);
        let generated = GeneratedSql::default();
        let out = SqlWriter
            .format(&Report::Data { comparison: &cmp, sql: &generated })
            .unwrap();
        assert!(!out.contains("BEGIN;"));
        assert!(out.contains("-- Summary: 0 added, 0 modified, 0 removed, 0 unchanged"));
    }
}
