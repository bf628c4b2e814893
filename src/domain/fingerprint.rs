use sha2::{Digest, Sha256};

use crate::domain::schema::SchemaDescription;
use crate::domain::value_objects::Fingerprint;

/// Compute a SHA-256 fingerprint of a schema's structure.
///
/// Algorithm:
/// 1. Each table is serialised to JSON (field order is fixed by the struct
///    definitions, so the encoding is deterministic).
/// 2. Table strings are sorted so the fingerprint does not depend on the order
///    the engine listed the tables in.
/// 3. All strings are joined with `\n` and hashed with SHA-256.
///
/// An empty schema produces a well-defined fingerprint (hash of empty string).
pub fn schema_fingerprint(schemas: &[SchemaDescription]) -> Fingerprint {
    let mut table_strings: Vec<String> = schemas
        .iter()
        .flat_map(|s| s.tables.iter())
        .map(|t| serde_json::to_string(t).unwrap_or_default())
        .collect();

    table_strings.sort_unstable();

    let content = table_strings.join("\n");
    let hash = Sha256::digest(content.as_bytes());
    Fingerprint(format!("{:x}", hash))
}
