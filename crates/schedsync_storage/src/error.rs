//! Error types for row store operations.

use schedsync_protocol::RowId;
use std::io;
use thiserror::Error;

/// Result type for row store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during row store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// No row with this identifier exists in the table.
    #[error("row {id} not found in table {table}")]
    RowNotFound {
        /// The table searched.
        table: String,
        /// The missing identifier.
        id: RowId,
    },

    /// A row with this identifier already exists.
    #[error("row {id} already exists in table {table}")]
    DuplicateRow {
        /// The table written to.
        table: String,
        /// The conflicting identifier.
        id: RowId,
    },

    /// The payload carries an attribute the table does not declare.
    #[error("unknown attribute {attribute:?} for table {table}")]
    UnknownAttribute {
        /// The table written to.
        table: String,
        /// The rejected attribute.
        attribute: String,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored data is inconsistent.
    #[error("storage corrupted: {0}")]
    Corrupted(String),
}

impl StorageError {
    /// Returns true if the error was caused by the request rather than the store.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StorageError::TableNotFound(_)
                | StorageError::RowNotFound { .. }
                | StorageError::DuplicateRow { .. }
                | StorageError::UnknownAttribute { .. }
        )
    }
}
