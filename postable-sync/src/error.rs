//! Error types for the sync layer.

use std::path::PathBuf;

use postable_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Setup-time failures. These are fatal: the synchronizer cannot be built.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The index table does not exist.
    #[error("storage target `{0}` does not exist")]
    StorageTargetNotFound(String),

    /// The index table lacks one of the identity columns.
    #[error("storage target `{target}` does not have the required fields: {}", .missing.join(", "))]
    MissingColumns { target: String, missing: Vec<String> },

    /// A mapping override names a column the index table does not have.
    #[error("mapping for `{source_type}` names column `{column}`, which `{target}` does not have")]
    UnknownColumn {
        source_type: String,
        target: String,
        column: String,
    },

    /// A mapping override tries to write one of the identity columns.
    #[error("mapping for `{source_type}` may not override key column `{column}`")]
    KeyColumnOverride { source_type: String, column: String },

    /// The config file could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Two `[[source]]` entries share a name.
    #[error("source `{0}` is configured more than once")]
    DuplicateSource(String),
}

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Failure in the underlying store, passed through unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A stored row could not be read as a source record or index row.
    #[error("invalid record: {0}")]
    InvalidRecord(#[from] postable_model::Error),
}
