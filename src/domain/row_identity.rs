use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::domain::error::CompareError;
use crate::domain::value::{normalize_value, CellValue, ComparableValue, RowData};
use crate::domain::value_objects::ColumnName;

/// The primary-key tuple of one row, in the caller-declared key order.
///
/// Equality and hashing go through the normalised form of each component, so
/// `1` and `1.0` identify the same row while `1` and `'1'` do not. The raw
/// values are kept for SQL generation and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<CellValue>", into = "Vec<CellValue>")]
pub struct RowIdentity {
    values: Vec<CellValue>,
    normalized: Vec<ComparableValue>,
}

impl RowIdentity {
    pub fn from_values(values: Vec<CellValue>) -> Self {
        let normalized = values.iter().map(normalize_value).collect();
        Self { values, normalized }
    }

    /// Key values, in key-column order.
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Deterministic string form of the tuple, usable as an external map key.
    ///
    /// Depends only on the key values and their order, never on the column
    /// order of the row the identity was taken from.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        for (i, v) in self.normalized.iter().enumerate() {
            if i > 0 {
                out.push('|');
            }
            v.write_canonical(&mut out);
        }
        out
    }

    /// Human-readable `col=value` rendering for logs and error messages.
    pub fn describe(&self, key_columns: &[String]) -> String {
        key_columns
            .iter()
            .zip(&self.values)
            .map(|(c, v)| format!("{}={}", c, serde_json::Value::from(v.clone())))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl PartialEq for RowIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.normalized == other.normalized
    }
}

impl Eq for RowIdentity {}

impl Hash for RowIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized.hash(state);
    }
}

impl From<Vec<CellValue>> for RowIdentity {
    fn from(values: Vec<CellValue>) -> Self {
        Self::from_values(values)
    }
}

impl From<RowIdentity> for Vec<CellValue> {
    fn from(id: RowIdentity) -> Self {
        id.values
    }
}

/// Extract the primary-key tuple of `row`, in the order of `pk_cols`.
///
/// A key column holding `NULL` is a valid component; a key column that is
/// absent from the row is a configuration error.
pub fn make_row_identity(row: &RowData, pk_cols: &[ColumnName]) -> Result<RowIdentity, CompareError> {
    let values = pk_cols
        .iter()
        .map(|col| {
            row.get(&col.0)
                .cloned()
                .ok_or_else(|| CompareError::MissingKeyColumn(col.0.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RowIdentity::from_values(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: serde_json::Value) -> RowData {
        serde_json::from_value(v).unwrap()
    }

    fn cols(names: &[&str]) -> Vec<ColumnName> {
        ColumnName::list(names)
    }

    #[test]
    fn follows_declared_key_order_not_row_order() {
        let a = row(json!({"region": "FR", "category": "books", "rate": 5}));
        let b = row(json!({"category": "books", "rate": 5, "region": "FR"}));
        let pk = cols(&["region", "category"]);

        let ida = make_row_identity(&a, &pk).unwrap();
        let idb = make_row_identity(&b, &pk).unwrap();
        assert_eq!(ida, idb);
        assert_eq!(ida.canonical_key(), idb.canonical_key());
        assert_eq!(ida.values()[0], CellValue::text("FR"));
    }

    #[test]
    fn swapped_key_order_is_a_different_identity() {
        let r = row(json!({"a": 1, "b": 2}));
        let ab = make_row_identity(&r, &cols(&["a", "b"])).unwrap();
        let ba = make_row_identity(&r, &cols(&["b", "a"])).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn missing_key_column_fails() {
        let r = row(json!({"id": 1}));
        let err = make_row_identity(&r, &cols(&["id", "tenant"])).unwrap_err();
        assert_eq!(err, CompareError::MissingKeyColumn("tenant".into()));
    }

    #[test]
    fn null_key_component_is_allowed() {
        let r = row(json!({"id": null}));
        let id = make_row_identity(&r, &cols(&["id"])).unwrap();
        assert!(id.values()[0].is_null());
    }

    #[test]
    fn text_and_number_keys_differ() {
        let a = make_row_identity(&row(json!({"id": 1})), &cols(&["id"])).unwrap();
        let b = make_row_identity(&row(json!({"id": "1"})), &cols(&["id"])).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn serializes_as_value_list() {
        let id = make_row_identity(&row(json!({"id": 7, "k": "x"})), &cols(&["id", "k"])).unwrap();
        let v = serde_json::to_value(&id).unwrap();
        assert_eq!(v, json!([7, "x"]));
        let back: RowIdentity = serde_json::from_value(v).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn describe_pairs_columns_and_values() {
        let id = make_row_identity(&row(json!({"id": 7, "k": "x"})), &cols(&["id", "k"])).unwrap();
        assert_eq!(id.describe(&["id".into(), "k".into()]), r#"id=7, k="x""#);
    }
}
