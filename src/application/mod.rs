pub mod comparison;
pub mod migration;
pub mod monitoring;
pub mod row_diff;
pub mod schema_diff;
pub mod sync_sql;
