use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::SourceError;
use crate::domain::fingerprint::schema_fingerprint;
use crate::domain::ports::SchemaSource;
use crate::domain::schema::SchemaDescription;
use crate::domain::value_objects::Fingerprint;

/// A persisted, point-in-time capture of a database's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    pub id: String,
    pub label: String,
    /// RFC 3339 capture time.
    pub created_at: String,
    pub fingerprint: Fingerprint,
    pub schemas: Vec<SchemaDescription>,
}

impl SchemaSnapshot {
    pub fn capture(label: &str, schemas: Vec<SchemaDescription>) -> Self {
        SchemaSnapshot {
            id: Uuid::new_v4().simple().to_string(),
            label: label.to_string(),
            created_at: Utc::now().to_rfc3339(),
            fingerprint: schema_fingerprint(&schemas),
            schemas,
        }
    }

    /// Number of tables across all schemas.
    pub fn table_count(&self) -> usize {
        self.schemas.iter().map(|s| s.tables.len()).sum()
    }
}

/// In-memory implementation of [`SchemaSource`] over captured snapshots.
///
/// Useful for callers that persist snapshots themselves (and for tests); see
/// [`crate::infrastructure::snapshot_store::FileSnapshotStore`] for the
/// on-disk variant.
#[derive(Debug, Default)]
pub struct MapSnapshotStore(BTreeMap<String, SchemaSnapshot>);

impl MapSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot and return its id.
    pub fn insert(&mut self, snapshot: SchemaSnapshot) -> String {
        let id = snapshot.id.clone();
        self.0.insert(id.clone(), snapshot);
        id
    }

    pub fn get(&self, id: &str) -> Option<&SchemaSnapshot> {
        self.0.get(id)
    }
}

#[async_trait]
impl SchemaSource for MapSnapshotStore {
    async fn fetch_schema(&self, id: &str) -> Result<Vec<SchemaDescription>, SourceError> {
        self.get(id)
            .map(|s| s.schemas.clone())
            .ok_or_else(|| SourceError::not_found("snapshot", id))
    }
}
