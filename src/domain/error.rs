use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors raised by the differencers.
///
/// Fatal to the single call; never retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    /// The comparison cannot run as configured (e.g. no primary key columns).
    #[error("invalid comparison config: {0}")]
    InvalidComparisonConfig(String),

    /// A row lacks one of the declared primary key columns.
    #[error("row is missing primary key column `{0}`")]
    MissingKeyColumn(String),
}

/// A diff reached a SQL generator in a shape the differencers never produce.
///
/// These indicate that the differencer and the generator disagree on the
/// contract; the whole generation fails and no partial SQL is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("malformed row diff for key {key}: {reason}")]
    MalformedRowDiff { key: String, reason: String },

    #[error("malformed diff for table `{table}`: {reason}")]
    MalformedTableDiff { table: String, reason: String },

    #[error("invalid comparison result: {0}")]
    InvalidComparison(String),

    #[error("invalid row selection: {0}")]
    InvalidSelection(String),
}

/// Failures reported by the collaborators behind the ports.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The named connection, snapshot or table does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: String },

    /// The collaborator failed (I/O, SQL error, decode error …).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl SourceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        SourceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

/// Umbrella error for the public entry points.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Machine-readable error category carried by a failed [`crate::Outcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidComparisonConfig,
    MissingKeyColumn,
    NotFound,
    GenerationFailed,
    SourceUnavailable,
}

impl CoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::Compare(CompareError::InvalidComparisonConfig(_)) => {
                ErrorCode::InvalidComparisonConfig
            }
            CoreError::Compare(CompareError::MissingKeyColumn(_)) => ErrorCode::MissingKeyColumn,
            CoreError::Generation(_) => ErrorCode::GenerationFailed,
            CoreError::Source(SourceError::NotFound { .. }) => ErrorCode::NotFound,
            CoreError::Source(SourceError::Backend(_)) => ErrorCode::SourceUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_entity() {
        let err = CoreError::from(SourceError::not_found("snapshot", "abc"));
        assert_eq!(err.to_string(), "snapshot not found");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[test]
    fn codes_follow_the_taxonomy() {
        let cfg = CoreError::from(CompareError::InvalidComparisonConfig("x".into()));
        assert_eq!(cfg.code(), ErrorCode::InvalidComparisonConfig);

        let key = CoreError::from(CompareError::MissingKeyColumn("id".into()));
        assert_eq!(key.code(), ErrorCode::MissingKeyColumn);
        assert_eq!(key.to_string(), "row is missing primary key column `id`");

        let gen = CoreError::from(GenerationError::InvalidSelection("x".into()));
        assert_eq!(gen.code(), ErrorCode::GenerationFailed);

        let backend = CoreError::from(SourceError::Backend(anyhow::anyhow!("disk I/O error")));
        assert_eq!(backend.code(), ErrorCode::SourceUnavailable);
        assert_eq!(backend.to_string(), "disk I/O error");
    }
}
