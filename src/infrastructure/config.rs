use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::value_objects::{ColumnName, ExcludedColumns, TableRef};

/// Runtime configuration: a TOML file overlaid with `LITEDIFF__*` environment
/// variables (`LITEDIFF__SOURCE__PATH`, `LITEDIFF__SYNC__INCLUDE_DELETES` …).
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub source: DbConfig,
    pub target: DbConfig,
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    /// Path of the database file.
    pub path: String,
    /// SQLCipher passphrase, applied with `PRAGMA key` on every connection.
    #[serde(default)]
    pub key: Option<String>,
    /// Display name; defaults to the file stem.
    #[serde(default)]
    pub label: Option<String>,
}

impl DbConfig {
    pub fn label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        Path::new(&self.path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.clone())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    pub name: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub excluded_columns: ExcludedColumns,
    /// Table name on the target side when it differs from `name`.
    #[serde(default)]
    pub target_name: Option<String>,
}

fn default_schema() -> String {
    "main".to_string()
}

impl TableConfig {
    pub fn source_table(&self) -> TableRef {
        TableRef::new(&self.schema, &self.name)
    }

    pub fn target_table(&self) -> TableRef {
        TableRef::new(&self.schema, self.target_name.as_deref().unwrap_or(&self.name))
    }

    pub fn primary_key_columns(&self) -> Vec<ColumnName> {
        ColumnName::list(&self.primary_key)
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SyncConfig {
    #[serde(default = "default_true")]
    pub include_inserts: bool,
    #[serde(default = "default_true")]
    pub include_updates: bool,
    /// Off unless asked for: deletes cannot be undone.
    #[serde(default)]
    pub include_deletes: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            include_inserts: true,
            include_updates: true,
            include_deletes: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_snapshot_dir() -> String {
    "snapshots".to_string()
}

impl AppConfig {
    /// Load from `path`, or from [`AppConfig::default_path`] when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path().context("Could not determine the config directory")?,
        };

        let cfg = config::Config::builder()
            .add_source(config::File::from(path.as_path()).required(true))
            .add_source(
                config::Environment::with_prefix("LITEDIFF")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        cfg.try_deserialize()
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// `<config_dir>/litediff/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("litediff").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        f.write_all(body.as_bytes()).unwrap();
        f
    }

    #[test]
    fn loads_full_config() {
        let f = write_config(
            r#"
            [source]
            path = "/data/dev.db"
            label = "dev"

            [target]
            path = "/data/prod.db"
            key = "s3cret"

            [[tables]]
            name = "users"
            primary_key = ["id"]
            excluded_columns = ["updated_at"]

            [[tables]]
            name = "tax_rules"
            schema = "archive"
            primary_key = ["region", "category"]
            target_name = "tax_rules_v2"

            [sync]
            include_deletes = true

            [output]
            dir = "out"
            "#,
        );

        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert_eq!(cfg.source.label(), "dev");
        assert_eq!(cfg.target.label(), "prod");
        assert_eq!(cfg.target.key.as_deref(), Some("s3cret"));

        assert_eq!(cfg.tables.len(), 2);
        assert_eq!(cfg.tables[0].schema, "main");
        assert!(cfg.tables[0].excluded_columns.contains("updated_at"));
        assert_eq!(cfg.tables[1].target_table(), TableRef::new("archive", "tax_rules_v2"));
        assert_eq!(cfg.tables[1].primary_key_columns().len(), 2);

        assert!(cfg.sync.include_inserts && cfg.sync.include_updates && cfg.sync.include_deletes);
        assert_eq!(cfg.output.dir, "out");
        assert_eq!(cfg.output.snapshot_dir, "snapshots");
    }

    #[test]
    fn deletes_default_off() {
        let f = write_config(
            r#"
            [source]
            path = "a.db"
            [target]
            path = "b.db"
            "#,
        );
        let cfg = AppConfig::load(Some(f.path())).unwrap();
        assert!(!cfg.sync.include_deletes);
        assert!(cfg.tables.is_empty());
        assert_eq!(cfg.output.dir, "output");
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/litediff.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
