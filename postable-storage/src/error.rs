//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The named table does not exist.
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// A row referenced a column the table does not have.
    #[error("unknown column `{column}` in table `{table}`")]
    UnknownColumn { table: String, column: String },

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A previous holder of the connection lock panicked.
    #[error("storage lock poisoned")]
    Poisoned,
}
