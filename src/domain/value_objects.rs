use serde::{Deserialize, Serialize};

/// Newtype to avoid confusion between schema names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema(pub String);

impl Schema {
    /// SQLite's default schema for the primary database file.
    pub fn main() -> Self {
        Schema("main".to_string())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::main()
    }
}

/// SHA-256 hex fingerprint of a schema snapshot's canonical content.
///
/// Computed by [`crate::domain::fingerprint::schema_fingerprint`] when a
/// snapshot is captured. Two snapshots with the same fingerprint describe the
/// same structure, so a store can reuse the existing one instead of writing a
/// duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
    /// Returns the raw hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Newtype for table names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableName(pub String);

/// Newtype for column names
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ColumnName(pub String);

impl ColumnName {
    /// Build a key-column list from plain strings.
    pub fn list<S: AsRef<str>>(names: &[S]) -> Vec<ColumnName> {
        names
            .iter()
            .map(|n| ColumnName(n.as_ref().to_string()))
            .collect()
    }
}

/// A schema-qualified table reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: Schema,
    pub name: TableName,
}

impl TableRef {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: Schema(schema.to_string()),
            name: TableName(name.to_string()),
        }
    }

    /// A table in the `main` schema.
    pub fn main(name: &str) -> Self {
        Self::new("main", name)
    }
}

/// List of columns to exclude from the diff (e.g., created_at, updated_at)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludedColumns(pub Vec<String>);

impl ExcludedColumns {
    pub fn contains(&self, col: &str) -> bool {
        self.0.iter().any(|c| c == col)
    }
}

/// Where one side of a schema comparison comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// A live database connection.
    Connection,
    /// A persisted schema snapshot.
    Snapshot,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Connection => f.write_str("connection"),
            SourceKind::Snapshot => f.write_str("snapshot"),
        }
    }
}

/// Outcome of matching one entity (row, table, column …) across both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffType {
    /// Present in source only.
    Added,
    /// Present in target only.
    Removed,
    /// Present on both sides with differences.
    Modified,
    /// Present on both sides and identical.
    Unchanged,
}

impl std::fmt::Display for DiffType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiffType::Added => "added",
            DiffType::Removed => "removed",
            DiffType::Modified => "modified",
            DiffType::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}
