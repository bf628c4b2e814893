use crate::domain::value::CellValue;

// ─────────────────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────────────────

/// SQL dialect: identifier quoting and literal formatting.
///
/// Used by the query builders, the sync/migration generators and the SQL
/// writer. The interface is pure string manipulation with no sqlx dependency,
/// so it crosses the layer boundary cleanly.
pub trait QueryDialect: Send + Sync {
    /// Lowercase dialect name ("sqlite"), recorded in generator logs.
    fn name(&self) -> &'static str;

    /// Quote an identifier (table, column, schema, index …).
    fn quote_ident(&self, s: &str) -> String;

    /// Return the `schema.` prefix for a qualified object reference.
    fn schema_prefix(&self, schema: &str) -> String {
        format!("{}.", self.quote_ident(schema))
    }

    /// `schema.table` (or just `table` when the schema needs no prefix).
    fn qualified(&self, schema: &str, name: &str) -> String {
        format!("{}{}", self.schema_prefix(schema), self.quote_ident(name))
    }

    /// Format a value as an SQL literal for this dialect.
    /// - Null          → `NULL`
    /// - Bool          → `TRUE` / `FALSE`
    /// - Integer/Real  → bare number
    /// - Text          → `'escaped'`, every `'` doubled
    /// - Blob          → `X'HEX'`
    /// - Json          → `'json'`, every `'` doubled
    fn sql_literal(&self, val: &CellValue) -> String {
        match val {
            CellValue::Null => "NULL".to_string(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Real(f) => self.real_literal(*f),
            CellValue::Text(s) => quote_string(s),
            CellValue::Blob(bytes) => format!("X'{}'", hex::encode_upper(bytes)),
            CellValue::Json(v) => self.json_literal(&quote_string(&v.to_string())),
        }
    }

    /// Render a real number. `{:?}` keeps a trailing `.0` on integral values
    /// so the literal stays a REAL, and switches to exponent notation for
    /// very large/small magnitudes.
    fn real_literal(&self, f: f64) -> String {
        if f.is_nan() {
            "NULL".to_string()
        } else if f.is_infinite() {
            if f > 0.0 { "9e999" } else { "-9e999" }.to_string()
        } else {
            format!("{:?}", f)
        }
    }

    /// Render an already-quoted JSON string literal.
    fn json_literal(&self, quoted: &str) -> String {
        quoted.to_string()
    }
}

/// Wrap `s` in single quotes, doubling every embedded single quote.
pub fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite / SQLCipher
// ─────────────────────────────────────────────────────────────────────────────

pub struct SqliteDialect;

impl QueryDialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    /// Plain identifiers that are not keywords are emitted bare; everything
    /// else is double-quoted with embedded `"` doubled.
    fn quote_ident(&self, s: &str) -> String {
        if is_plain_identifier(s) && !is_keyword(s) {
            s.to_string()
        } else {
            format!("\"{}\"", s.replace('"', "\"\""))
        }
    }

    fn schema_prefix(&self, schema: &str) -> String {
        // Unqualified names resolve to `main` first.
        if schema.is_empty() || schema.eq_ignore_ascii_case("main") {
            String::new()
        } else {
            format!("{}.", self.quote_ident(schema))
        }
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_keyword(s: &str) -> bool {
    let upper = s.to_ascii_uppercase();
    SQLITE_KEYWORDS.binary_search(&upper.as_str()).is_ok()
}

/// https://www.sqlite.org/lang_keywords.html (sorted)
const SQLITE_KEYWORDS: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN", "WHERE",
    "WINDOW", "WITH", "WITHOUT",
];

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
