use serde::Serialize;

use crate::domain::row_diff::TableComparisonResult;
use crate::domain::schema_diff::SchemaComparisonResult;
use crate::domain::sync::GeneratedSql;

/// A finished comparison together with the SQL generated from it, ready to be
/// handed to an [`crate::domain::ports::OutputWriter`].
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Report<'a> {
    Data {
        comparison: &'a TableComparisonResult,
        sql: &'a GeneratedSql,
    },
    Schema {
        comparison: &'a SchemaComparisonResult,
        sql: &'a GeneratedSql,
    },
}

impl Report<'_> {
    pub fn sql(&self) -> &GeneratedSql {
        match self {
            Report::Data { sql, .. } | Report::Schema { sql, .. } => sql,
        }
    }

    /// One-line description used in file headers.
    pub fn title(&self) -> String {
        match self {
            Report::Data { comparison, .. } => format!(
                "data sync {}.{} -> {}.{}",
                comparison.source_schema,
                comparison.source_table,
                comparison.target_schema,
                comparison.target_table
            ),
            Report::Schema { comparison, .. } => format!(
                "schema migration {} ({}) -> {} ({})",
                comparison.source_label,
                comparison.source_kind,
                comparison.target_label,
                comparison.target_kind
            ),
        }
    }

    /// File name stem, restricted to characters safe on every filesystem.
    /// Data stems carry the target schema so same-named tables in different
    /// schemas get separate files.
    pub fn file_stem(&self) -> String {
        let raw = match self {
            Report::Data { comparison, .. } => {
                format!("data_{}_{}", comparison.target_schema, comparison.target_table)
            }
            Report::Schema { comparison, .. } => {
                format!("schema_{}_to_{}", comparison.source_label, comparison.target_label)
            }
        };
        raw.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema_diff::SchemaEndpoint;
    use crate::domain::value_objects::TableRef;

    #[test]
    fn file_stem_is_sanitized() {
        let cmp = SchemaComparisonResult::new(
            &SchemaEndpoint::connection("a", "prod db"),
            &SchemaEndpoint::snapshot("b", "v1/2"),
            vec![],
        );
        let sql = GeneratedSql::default();
        let r = Report::Schema { comparison: &cmp, sql: &sql };
        assert_eq!(r.file_stem(), "schema_prod_db_to_v1_2");
        assert_eq!(r.title(), "schema migration prod db (connection) -> v1/2 (snapshot)");
    }

    #[test]
    fn data_title_names_both_tables() {
        let cmp = TableComparisonResult::new(
            &TableRef::main("users"),
            &TableRef::new("replica", "users"),
            vec!["id".into()],
            vec![],
        );
        let sql = GeneratedSql::default();
        let r = Report::Data { comparison: &cmp, sql: &sql };
        assert_eq!(r.title(), "data sync main.users -> replica.users");
        assert_eq!(r.file_stem(), "data_replica_users");
    }

    #[test]
    fn same_table_in_two_schemas_gets_two_stems() {
        let sql = GeneratedSql::default();
        let stem = |t: &TableRef| {
            let cmp = TableComparisonResult::new(t, t, vec!["id".into()], vec![]);
            Report::Data { comparison: &cmp, sql: &sql }.file_stem()
        };
        let main = stem(&TableRef::main("users"));
        let archive = stem(&TableRef::new("archive", "users"));
        assert_eq!(main, "data_main_users");
        assert_ne!(main, archive);
    }
}
