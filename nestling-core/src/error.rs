//! Error type carried inside data-layer results.

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::automerge::{ReaderError, StorageError};

/// A backend failure, carried as data inside service results.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Document store error: {0}")]
    Document(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Backend operation panicked: {0}")]
    Panicked(String),
}

impl DataError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DataError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound { .. })
    }
}

impl Serialize for DataError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<sqlx::Error> for DataError {
    fn from(e: sqlx::Error) -> Self {
        DataError::Database(e.to_string())
    }
}

impl From<StorageError> for DataError {
    fn from(e: StorageError) -> Self {
        DataError::Document(e.to_string())
    }
}

impl From<ReaderError> for DataError {
    fn from(e: ReaderError) -> Self {
        DataError::Document(e.to_string())
    }
}

impl From<automerge::AutomergeError> for DataError {
    fn from(e: automerge::AutomergeError) -> Self {
        DataError::Document(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = DataError::not_found("Baby", "abc");
        assert_eq!(err.to_string(), "Baby not found: abc");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_sqlx_error_converts_to_database() {
        let err: DataError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DataError::Database(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_serializes_as_message() {
        let err = DataError::Document("boom".into());
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            "\"Document store error: boom\""
        );
    }
}
