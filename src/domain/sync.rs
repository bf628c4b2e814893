use serde::{Deserialize, Serialize};

use crate::domain::row_diff::TableComparisonResult;
use crate::domain::value::RowData;

/// Input of the sync SQL generator.
///
/// Deletes are off unless asked for: they are destructive and cannot be
/// undone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub comparison: TableComparisonResult,
    /// Primary-key value objects (`{"id": 1}`) restricting which rows are
    /// synced. Empty means every row.
    #[serde(default)]
    pub selected_rows: Vec<RowData>,
    #[serde(default = "default_true")]
    pub include_inserts: bool,
    #[serde(default = "default_true")]
    pub include_updates: bool,
    #[serde(default)]
    pub include_deletes: bool,
}

fn default_true() -> bool {
    true
}

impl SyncRequest {
    pub fn new(comparison: TableComparisonResult) -> Self {
        Self {
            comparison,
            selected_rows: Vec::new(),
            include_inserts: true,
            include_updates: true,
            include_deletes: false,
        }
    }

    pub fn with_inserts(mut self, on: bool) -> Self {
        self.include_inserts = on;
        self
    }

    pub fn with_updates(mut self, on: bool) -> Self {
        self.include_updates = on;
        self
    }

    pub fn with_deletes(mut self, on: bool) -> Self {
        self.include_deletes = on;
        self
    }

    pub fn with_selected_rows(mut self, rows: Vec<RowData>) -> Self {
        self.selected_rows = rows;
        self
    }
}

/// Generated SQL: ordered statements, their joined text, and warnings for the
/// user to review before execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSql {
    /// Statements joined by a blank line; each ends with `;`.
    pub sql: String,
    pub statements: Vec<String>,
    pub warnings: Vec<String>,
}

impl GeneratedSql {
    pub fn new(statements: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            sql: statements.join("\n\n"),
            statements,
            warnings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
