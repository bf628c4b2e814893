pub mod dialect;
pub mod error;
pub mod fingerprint;
pub mod outcome;
pub mod ports;
pub mod report;
pub mod row_diff;
pub mod row_identity;
pub mod schema;
pub mod schema_diff;
pub mod snapshot;
pub mod sync;
pub mod value;
pub mod value_objects;
