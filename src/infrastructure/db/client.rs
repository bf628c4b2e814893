use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use indexmap::{map::Entry, IndexMap};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::domain::dialect::{quote_string, QueryDialect, SqliteDialect};
use crate::domain::error::SourceError;
use crate::domain::ports::{RowSource, SchemaSource};
use crate::domain::schema::{
    ColumnSchema, ForeignKeySchema, IndexSchema, SchemaDescription, TableSchema, TriggerSchema,
};
use crate::domain::value::RowData;
use crate::domain::value_objects::{ColumnName, TableRef};
use crate::infrastructure::config::DbConfig;
use crate::infrastructure::db::row_mapper::row_to_data;
use crate::infrastructure::db::sql_utils::{build_select_query, master_table, parse_trigger_header};

/// Open a pool on the database file described in `cfg`.
///
/// When `cfg.key` is set it is applied with `PRAGMA key` before anything else
/// runs on each connection, which unlocks SQLCipher databases.
pub async fn connect(cfg: &DbConfig) -> Result<SqlitePool> {
    let mut opts = SqliteConnectOptions::new()
        .filename(&cfg.path)
        .create_if_missing(false);
    if let Some(key) = &cfg.key {
        opts = opts.pragma("key", quote_string(key));
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open {}", cfg.path))?;

    debug!("Opened {} ({})", cfg.path, cfg.label());
    Ok(pool)
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection registry
// ─────────────────────────────────────────────────────────────────────────────

/// Open SQLite pools keyed by connection id. Implements both read ports.
#[derive(Clone)]
pub struct SqliteConnections {
    pools: HashMap<String, SqlitePool>,
    dialect: Arc<dyn QueryDialect>,
}

impl Default for SqliteConnections {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteConnections {
    pub fn new() -> Self {
        Self {
            pools: HashMap::new(),
            dialect: Arc::new(SqliteDialect),
        }
    }

    /// Register an already-open pool.
    pub fn insert(&mut self, id: impl Into<String>, pool: SqlitePool) {
        self.pools.insert(id.into(), pool);
    }

    /// Open `cfg` and register it under `id`.
    pub async fn open(&mut self, id: impl Into<String>, cfg: &DbConfig) -> Result<()> {
        let pool = connect(cfg).await?;
        self.insert(id, pool);
        Ok(())
    }

    pub fn pool(&self, id: &str) -> Result<&SqlitePool, SourceError> {
        self.pools
            .get(id)
            .ok_or_else(|| SourceError::not_found("connection", id))
    }

    async fn table_exists(&self, pool: &SqlitePool, table: &TableRef) -> Result<bool> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE type IN ('table', 'view') AND name = ?1",
            master_table(&table.schema.0, self.dialect.as_ref())
        );
        let found = sqlx::query(&sql)
            .bind(&table.name.0)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("Failed to look up {}.{}", table.schema.0, table.name.0))?;
        Ok(found.is_some())
    }

    // ─── Introspection ───

    async fn schema_names(&self, pool: &SqlitePool) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT name FROM pragma_database_list ORDER BY seq")
            .fetch_all(pool)
            .await
            .context("Failed to list attached databases")?;
        let mut names = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get(0)?;
            if name != "temp" {
                names.push(name);
            }
        }
        Ok(names)
    }

    async fn describe_schema(&self, pool: &SqlitePool, schema: &str) -> Result<SchemaDescription> {
        let sql = format!(
            "SELECT name FROM {} WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY name",
            master_table(schema, self.dialect.as_ref())
        );
        debug!("Executing: {}", sql);
        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .with_context(|| format!("Failed to list tables of {}", schema))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get(0)?;
            tables.push(self.describe_table(pool, schema, &name).await?);
        }
        Ok(SchemaDescription {
            name: schema.to_string(),
            tables,
        })
    }

    async fn describe_table(&self, pool: &SqlitePool, schema: &str, table: &str) -> Result<TableSchema> {
        let ctx = || format!("Failed to introspect {}.{}", schema, table);

        let columns = sqlx::query(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1, ?2) ORDER BY cid"#,
        )
        .bind(table)
        .bind(schema)
        .fetch_all(pool)
        .await
        .with_context(ctx)?
        .iter()
        .map(|r| {
            Ok(ColumnSchema {
                name: r.try_get(0)?,
                data_type: r.try_get(1)?,
                nullable: r.try_get::<i64, _>(2)? == 0,
                default_value: r.try_get(3)?,
                primary_key_position: u32::try_from(r.try_get::<i64, _>(4)?)
                    .ok()
                    .filter(|pos| *pos > 0),
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let mut result = TableSchema::new(schema, table, columns);
        result.indexes = self.describe_indexes(pool, schema, table).await.with_context(ctx)?;
        result.foreign_keys = self.describe_foreign_keys(pool, schema, table).await.with_context(ctx)?;
        result.triggers = self.describe_triggers(pool, schema, table).await.with_context(ctx)?;
        Ok(result)
    }

    /// Explicitly created indexes only; the automatic indexes SQLite builds for
    /// PRIMARY KEY / UNIQUE constraints are part of the table definition.
    async fn describe_indexes(&self, pool: &SqlitePool, schema: &str, table: &str) -> Result<Vec<IndexSchema>> {
        let list = sqlx::query(r#"SELECT name, "unique", origin FROM pragma_index_list(?1, ?2) ORDER BY name"#)
            .bind(table)
            .bind(schema)
            .fetch_all(pool)
            .await?;

        let mut indexes = Vec::with_capacity(list.len());
        for row in &list {
            let name: String = row.try_get(0)?;
            let origin: String = row.try_get(2)?;
            if origin != "c" || name.starts_with("sqlite_autoindex_") {
                continue;
            }

            let members = sqlx::query("SELECT name FROM pragma_index_info(?1, ?2) ORDER BY seqno")
                .bind(&name)
                .bind(schema)
                .fetch_all(pool)
                .await?;
            let columns: Vec<Option<String>> = members
                .iter()
                .map(|m| m.try_get(0))
                .collect::<Result<_, _>>()?;

            // Expression members have no column name.
            if columns.iter().any(Option::is_none) {
                debug!(index = %name, "skipping expression index");
                continue;
            }

            indexes.push(IndexSchema {
                name,
                columns: columns.into_iter().flatten().collect(),
                unique: row.try_get::<i64, _>(1)? != 0,
            });
        }
        Ok(indexes)
    }

    /// One entry per constraint: the pragma lists a composite key as one row
    /// per column, sharing an `id`.
    async fn describe_foreign_keys(
        &self,
        pool: &SqlitePool,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ForeignKeySchema>> {
        let rows = sqlx::query(
            r#"SELECT id, "from", "table", "to", on_update, on_delete FROM pragma_foreign_key_list(?1, ?2) ORDER BY id, seq"#,
        )
        .bind(table)
        .bind(schema)
        .fetch_all(pool)
        .await?;

        let mut grouped: IndexMap<i64, ForeignKeySchema> = IndexMap::new();
        for row in &rows {
            let id: i64 = row.try_get(0)?;
            let column: String = row.try_get(1)?;
            let referenced: Option<String> = row.try_get(3)?;
            let fk = match grouped.entry(id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(e) => e.insert(ForeignKeySchema {
                    name: String::new(),
                    columns: Vec::new(),
                    referenced_table: row.try_get(2)?,
                    referenced_columns: Vec::new(),
                    on_update: row.try_get(4)?,
                    on_delete: row.try_get(5)?,
                }),
            };
            fk.columns.push(column);
            if let Some(r) = referenced {
                fk.referenced_columns.push(r);
            }
        }

        // Two keys over the same columns and parent would share a name.
        let mut used = HashSet::new();
        let mut fks = Vec::with_capacity(grouped.len());
        for (id, mut fk) in grouped {
            let base = format!("fk_{}_{}", fk.columns.join("_"), fk.referenced_table);
            fk.name = if used.contains(&base) { format!("{}_{}", base, id) } else { base };
            used.insert(fk.name.clone());
            fks.push(fk);
        }
        Ok(fks)
    }

    async fn describe_triggers(&self, pool: &SqlitePool, schema: &str, table: &str) -> Result<Vec<TriggerSchema>> {
        let sql = format!(
            "SELECT name, sql FROM {} WHERE type = 'trigger' AND tbl_name = ?1 ORDER BY name",
            master_table(schema, self.dialect.as_ref())
        );
        let rows = sqlx::query(&sql).bind(table).fetch_all(pool).await?;

        let mut triggers = Vec::with_capacity(rows.len());
        for row in &rows {
            let sql: String = row.try_get::<Option<String>, _>(1)?.unwrap_or_default();
            let (timing, event) = parse_trigger_header(&sql);
            triggers.push(TriggerSchema {
                name: row.try_get(0)?,
                timing,
                event,
                sql,
            });
        }
        Ok(triggers)
    }
}

#[async_trait]
impl RowSource for SqliteConnections {
    async fn fetch_table_rows(
        &self,
        connection_id: &str,
        table: &TableRef,
        primary_keys: &[ColumnName],
    ) -> Result<Vec<RowData>, SourceError> {
        let pool = self.pool(connection_id)?;
        if !self.table_exists(pool, table).await? {
            return Err(SourceError::not_found("table", &table.name.0));
        }

        let query = build_select_query(table, primary_keys, self.dialect.as_ref());
        debug!("Executing: {}", query);

        let rows = sqlx::query(&query)
            .fetch_all(pool)
            .await
            .with_context(|| format!("Failed to query {}.{}", table.schema.0, table.name.0))?;

        let mut result = Vec::with_capacity(rows.len());
        for row in &rows {
            result.push(row_to_data(row)?);
        }
        Ok(result)
    }
}

#[async_trait]
impl SchemaSource for SqliteConnections {
    async fn fetch_schema(&self, id: &str) -> Result<Vec<SchemaDescription>, SourceError> {
        let pool = self.pool(id)?;
        let mut schemas = Vec::new();
        for name in self.schema_names(pool).await? {
            schemas.push(self.describe_schema(pool, &name).await?);
        }
        Ok(schemas)
    }
}
