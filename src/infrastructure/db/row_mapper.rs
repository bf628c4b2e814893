use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::domain::value::{CellValue, RowData};

/// Convert a sqlx `SqliteRow` into `RowData`, keeping the column order of the
/// result set.
///
/// SQLite types values, not columns, so each cell is decoded from its runtime
/// storage class. The declared column type is only consulted to surface
/// `BOOLEAN` columns as booleans.
pub fn row_to_data(row: &SqliteRow) -> Result<RowData> {
    let mut data = RowData::with_capacity(row.len());
    for col in row.columns() {
        let idx = col.ordinal();
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            CellValue::Null
        } else {
            let storage = raw.type_info().name().to_string();
            decode(row, idx, &storage, col.type_info().name())?
        };
        data.insert(col.name().to_string(), value);
    }
    Ok(data)
}

fn decode(row: &SqliteRow, idx: usize, storage: &str, declared: &str) -> Result<CellValue> {
    let value = match storage {
        "INTEGER" => {
            let i: i64 = row.try_get_unchecked(idx)?;
            if declared.eq_ignore_ascii_case("BOOLEAN") {
                CellValue::Bool(i != 0)
            } else {
                CellValue::Integer(i)
            }
        }
        "REAL" => CellValue::Real(row.try_get_unchecked::<f64, _>(idx)?),
        "BLOB" => CellValue::Blob(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        _ => CellValue::Text(row.try_get_unchecked::<String, _>(idx)?),
    };
    Ok(value)
}
