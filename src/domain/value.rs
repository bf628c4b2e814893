use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// A database row: column name → value, in the column order the engine returned.
pub type RowData = IndexMap<String, CellValue>;

/// JSON key used to carry binary values through JSON (`{"$blob": "<hex>"}`).
const BLOB_KEY: &str = "$blob";

/// One materialized SQL value.
///
/// Serialises to plain JSON (`null`, booleans, numbers, strings, nested
/// objects/arrays) so diff results cross the IPC boundary unchanged. Binary
/// values travel as `{"$blob": "<hex>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// A structured object or array value.
    Json(Value),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }
}

impl From<Value> for CellValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => CellValue::Text(s),
            Value::Object(map) => match blob_from_object(&map) {
                Some(bytes) => CellValue::Blob(bytes),
                None => CellValue::Json(Value::Object(map)),
            },
            Value::Array(_) => CellValue::Json(v),
        }
    }
}

impl From<CellValue> for Value {
    fn from(v: CellValue) -> Self {
        match v {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(b),
            CellValue::Integer(i) => Value::Number(i.into()),
            CellValue::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            CellValue::Text(s) => Value::String(s),
            CellValue::Blob(bytes) => {
                let mut map = Map::new();
                map.insert(BLOB_KEY.to_string(), Value::String(hex::encode(bytes)));
                Value::Object(map)
            }
            CellValue::Json(v) => v,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Real(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<Vec<u8>> for CellValue {
    fn from(bytes: Vec<u8>) -> Self {
        CellValue::Blob(bytes)
    }
}

fn blob_from_object(map: &Map<String, Value>) -> Option<Vec<u8>> {
    if map.len() != 1 {
        return None;
    }
    match map.get(BLOB_KEY) {
        Some(Value::String(h)) => hex::decode(h).ok(),
        _ => None,
    }
}

/// Canonical comparable form of a [`CellValue`].
///
/// Equality on this type is the equality the differencers use:
/// - `NULL` and an absent column collapse to [`ComparableValue::Null`], which is
///   distinct from the text `"null"`;
/// - text is never coerced to a number (`'1'` ≠ `1`);
/// - integers and integral reals share one numeric domain (`1` = `1.0`);
/// - binary data compares by its hex content;
/// - objects/arrays compare by their serialisation, keys in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComparableValue {
    Null,
    Bool(bool),
    Integer(i64),
    /// IEEE-754 bits of a non-integral real.
    Real(u64),
    Text(String),
    Blob(String),
    Json(String),
}

impl ComparableValue {
    /// Append an unambiguous textual encoding of this value to `out`.
    ///
    /// Variable-length payloads are length-prefixed so that the encoding of a
    /// tuple can be built by plain concatenation.
    pub fn write_canonical(&self, out: &mut String) {
        use std::fmt::Write;
        // Writing to a String cannot fail.
        let _ = match self {
            ComparableValue::Null => write!(out, "N"),
            ComparableValue::Bool(b) => write!(out, "B{}", u8::from(*b)),
            ComparableValue::Integer(i) => write!(out, "I{i};"),
            ComparableValue::Real(bits) => write!(out, "R{bits:016x}"),
            ComparableValue::Text(s) => write!(out, "T{}:{s}", s.len()),
            ComparableValue::Blob(h) => write!(out, "X{}:{h}", h.len()),
            ComparableValue::Json(s) => write!(out, "J{}:{s}", s.len()),
        };
    }
}

/// Produce the canonical comparable form of a value.
pub fn normalize_value(value: &CellValue) -> ComparableValue {
    match value {
        CellValue::Null => ComparableValue::Null,
        CellValue::Bool(b) => ComparableValue::Bool(*b),
        CellValue::Integer(i) => ComparableValue::Integer(*i),
        CellValue::Real(f) => normalize_real(*f),
        CellValue::Text(s) => ComparableValue::Text(s.clone()),
        CellValue::Blob(bytes) => ComparableValue::Blob(hex::encode(bytes)),
        CellValue::Json(v) => ComparableValue::Json(v.to_string()),
    }
}

/// Normalise an optional value, treating an absent column as `NULL`.
pub fn normalize_cell(value: Option<&CellValue>) -> ComparableValue {
    value.map_or(ComparableValue::Null, normalize_value)
}

// 2^63: the first f64 outside the i64 range.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

fn normalize_real(f: f64) -> ComparableValue {
    if f.is_nan() {
        return ComparableValue::Real(f64::NAN.to_bits());
    }
    if f.is_finite() && f.fract() == 0.0 && f >= -I64_BOUND && f < I64_BOUND {
        return ComparableValue::Integer(f as i64);
    }
    ComparableValue::Real(f.to_bits())
}
