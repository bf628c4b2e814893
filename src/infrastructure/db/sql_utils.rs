use crate::domain::value_objects::{ColumnName, TableRef};
use crate::domain::dialect::QueryDialect;

// ─────────────────────────────────────────────────────────────────────────────
// Query builders
// ─────────────────────────────────────────────────────────────────────────────

/// Build a `SELECT * FROM <schema>.<table> ORDER BY <pk_cols>` query.
/// `ORDER BY` is omitted when `pk_cols` is empty to avoid a SQL syntax error.
pub fn build_select_query(table: &TableRef, pk_cols: &[ColumnName], dialect: &dyn QueryDialect) -> String {
    let table_q = dialect.qualified(&table.schema.0, &table.name.0);
    let order_cols: Vec<String> = pk_cols.iter().map(|c| dialect.quote_ident(&c.0)).collect();
    if order_cols.is_empty() {
        format!("SELECT * FROM {}", table_q)
    } else {
        format!("SELECT * FROM {} ORDER BY {}", table_q, order_cols.join(", "))
    }
}

/// `<schema>.sqlite_master`; always qualified so attached databases resolve.
pub fn master_table(schema: &str, dialect: &dyn QueryDialect) -> String {
    format!("{}.sqlite_master", dialect.quote_ident(schema))
}

// ─────────────────────────────────────────────────────────────────────────────
// Trigger header parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Extract `(timing, event)` from a stored `CREATE TRIGGER` statement.
///
/// Only the header up to `ON` is inspected. SQLite defaults the timing to
/// `BEFORE` when none is written.
pub fn parse_trigger_header(sql: &str) -> (String, String) {
    let mut timing = "BEFORE".to_string();
    let mut event = String::new();

    let mut tokens = sql.split_whitespace().map(|t| t.to_ascii_uppercase());
    while let Some(tok) = tokens.next() {
        match tok.as_str() {
            "BEFORE" | "AFTER" => timing = tok.clone(),
            "INSTEAD" => timing = "INSTEAD OF".to_string(),
            "INSERT" | "DELETE" | "UPDATE" if event.is_empty() => event = tok.clone(),
            "ON" if !event.is_empty() => break,
            _ => {}
        }
    }
    (timing, event)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dialect::SqliteDialect;

    #[test]
    fn test_build_select_query_main_schema() {
        let q = build_select_query(&TableRef::main("rules"), &ColumnName::list(&["id"]), &SqliteDialect);
        assert_eq!(q, "SELECT * FROM rules ORDER BY id");
    }

    #[test]
    fn test_build_select_query_attached_schema_composite_key() {
        let q = build_select_query(
            &TableRef::new("archive", "order"),
            &ColumnName::list(&["region", "group"]),
            &SqliteDialect,
        );
        assert_eq!(q, r#"SELECT * FROM archive."order" ORDER BY region, "group""#);
    }

    #[test]
    fn test_build_select_query_no_pk_omits_order_by() {
        let q = build_select_query(&TableRef::main("t"), &[], &SqliteDialect);
        assert_eq!(q, "SELECT * FROM t");
    }

    #[test]
    fn test_master_table_is_qualified() {
        assert_eq!(master_table("main", &SqliteDialect), "main.sqlite_master");
        assert_eq!(master_table("my db", &SqliteDialect), r#""my db".sqlite_master"#);
    }

    #[test]
    fn test_parse_trigger_header() {
        assert_eq!(
            parse_trigger_header("CREATE TRIGGER t1 AFTER UPDATE OF name ON users BEGIN SELECT 1; END"),
            ("AFTER".to_string(), "UPDATE".to_string())
        );
        assert_eq!(
            parse_trigger_header("create trigger t2 instead of delete on v begin select 1; end"),
            ("INSTEAD OF".to_string(), "DELETE".to_string())
        );
        assert_eq!(
            parse_trigger_header("CREATE TRIGGER IF NOT EXISTS t3 INSERT ON users BEGIN DELETE FROM x; END"),
            ("BEFORE".to_string(), "INSERT".to_string())
        );
    }
}
