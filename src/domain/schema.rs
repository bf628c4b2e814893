use serde::{Deserialize, Serialize};

/// One column of a table, as reported by `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub name: String,
    /// Declared type, verbatim (may be empty in SQLite).
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    /// Default value as the SQL expression text stored in the schema.
    #[serde(default)]
    pub default_value: Option<String>,
    /// 1-based position within the primary key; `None` for non-key columns.
    #[serde(default)]
    pub primary_key_position: Option<u32>,
}

impl ColumnSchema {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: true,
            default_value: None,
            primary_key_position: None,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key_position.is_some()
    }

    /// Sole primary-key column.
    pub fn primary_key(self) -> Self {
        self.primary_key_at(1)
    }

    pub fn primary_key_at(mut self, position: u32) -> Self {
        self.primary_key_position = Some(position);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, expr: &str) -> Self {
        self.default_value = Some(expr.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeySchema {
    /// SQLite foreign keys are unnamed; introspection synthesises
    /// `fk_<columns>_<referenced table>`.
    pub name: String,
    /// Child columns, in constraint order.
    pub columns: Vec<String>,
    pub referenced_table: String,
    /// Parent columns matching `columns` pairwise. Empty when the key
    /// references the parent's primary key implicitly.
    pub referenced_columns: Vec<String>,
    pub on_delete: String,
    pub on_update: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerSchema {
    pub name: String,
    /// `BEFORE`, `AFTER` or `INSTEAD OF`.
    pub timing: String,
    /// `INSERT`, `UPDATE` or `DELETE`.
    pub event: String,
    /// The full `CREATE TRIGGER` statement as stored in `sqlite_master`.
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSchema {
    pub name: String,
    pub schema: String,
    pub columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub indexes: Vec<IndexSchema>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySchema>,
    #[serde(default)]
    pub triggers: Vec<TriggerSchema>,
}

impl TableSchema {
    pub fn new(schema: &str, name: &str, columns: Vec<ColumnSchema>) -> Self {
        Self {
            name: name.to_string(),
            schema: schema.to_string(),
            columns,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            triggers: Vec::new(),
        }
    }

    /// Primary-key columns in key order, which may differ from column order.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        let mut keyed: Vec<(u32, &str)> = self
            .columns
            .iter()
            .filter_map(|c| c.primary_key_position.map(|pos| (pos, c.name.as_str())))
            .collect();
        keyed.sort_by_key(|(pos, _)| *pos);
        keyed.into_iter().map(|(_, name)| name).collect()
    }
}

/// All tables of one schema (`main`, or an attached database).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDescription {
    pub name: String,
    pub tables: Vec<TableSchema>,
}

/// Flatten schema descriptions into one table list, preserving order.
pub fn all_tables(schemas: &[SchemaDescription]) -> Vec<TableSchema> {
    schemas
        .iter()
        .flat_map(|s| s.tables.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_key_columns_follow_key_order() {
        let t = TableSchema::new(
            "main",
            "parent",
            vec![
                ColumnSchema::new("a", "INTEGER").primary_key_at(2),
                ColumnSchema::new("b", "INTEGER").primary_key_at(1),
                ColumnSchema::new("note", "TEXT"),
            ],
        );
        assert_eq!(t.primary_key_columns(), ["b", "a"]);
        assert!(!t.columns[2].is_primary_key());
    }
}
