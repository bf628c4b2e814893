use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::error::SourceError;
use crate::domain::ports::SchemaSource;
use crate::domain::schema::SchemaDescription;
use crate::domain::snapshot::SchemaSnapshot;

// ─────────────────────────────────────────────────────────────────────────────
// FileSnapshotStore
// ─────────────────────────────────────────────────────────────────────────────

/// Schema snapshots persisted as `<dir>/<id>.json`.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persist `snapshot` and return its id.
    ///
    /// If a stored snapshot already has the same fingerprint its id is
    /// returned instead and nothing is written.
    pub fn save(&self, snapshot: &SchemaSnapshot) -> Result<String> {
        if let Some(existing) = self
            .list()?
            .into_iter()
            .find(|s| s.fingerprint == snapshot.fingerprint)
        {
            info!(id = %existing.id, label = %existing.label, "schema unchanged, reusing snapshot");
            return Ok(existing.id);
        }

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;
        let path = self.path_for(&snapshot.id);
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        info!(id = %snapshot.id, tables = snapshot.table_count(), "snapshot saved");
        Ok(snapshot.id.clone())
    }

    /// `Ok(None)` when no snapshot with this id exists.
    pub fn load(&self, id: &str) -> Result<Option<SchemaSnapshot>> {
        let path = self.path_for(id);
        if !path.is_file() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let snapshot = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
        Ok(Some(snapshot))
    }

    /// All stored snapshots, oldest first. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<SchemaSnapshot>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = fs::read_to_string(&path)?;
            match serde_json::from_str::<SchemaSnapshot>(&text) {
                Ok(s) => snapshots.push(s),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping unreadable snapshot"),
            }
        }
        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(snapshots)
    }
}

#[async_trait]
impl SchemaSource for FileSnapshotStore {
    async fn fetch_schema(&self, id: &str) -> Result<Vec<SchemaDescription>, SourceError> {
        self.load(id)?
            .map(|s| s.schemas)
            .ok_or_else(|| SourceError::not_found("snapshot", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{ColumnSchema, TableSchema};

    fn schemas(columns: &[&str]) -> Vec<SchemaDescription> {
        vec![SchemaDescription {
            name: "main".into(),
            tables: vec![TableSchema::new(
                "main",
                "users",
                columns.iter().map(|c| ColumnSchema::new(c, "TEXT")).collect(),
            )],
        }]
    }

    #[test]
    fn save_dedupes_on_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("snaps"));

        let first = store.save(&SchemaSnapshot::capture("v1", schemas(&["id"]))).unwrap();
        let again = store.save(&SchemaSnapshot::capture("v1 again", schemas(&["id"]))).unwrap();
        assert_eq!(first, again);

        let other = store.save(&SchemaSnapshot::capture("v2", schemas(&["id", "email"]))).unwrap();
        assert_ne!(first, other);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn fetch_schema_reads_saved_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path());
        let id = store.save(&SchemaSnapshot::capture("v1", schemas(&["id"]))).unwrap();

        assert_eq!(store.fetch_schema(&id).await.unwrap(), schemas(&["id"]));
        let err = store.fetch_schema("missing").await.unwrap_err();
        assert_eq!(err.to_string(), "snapshot not found");
    }

    #[test]
    fn missing_dir_lists_nothing() {
        let store = FileSnapshotStore::new("/nonexistent/litediff-snapshots");
        assert!(store.list().unwrap().is_empty());
        assert!(store.load("x").unwrap().is_none());
    }
}
