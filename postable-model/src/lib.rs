//! Core model for Postable.
//!
//! Defines the types shared by the storage layer and the index synchronizer:
//! - [`SourceRecord`]: one persisted entity of a source type (id + field map)
//! - [`SourceType`]: a source type's name and the table its records live in
//! - [`IndexRow`]: one row of the shared index table
//! - [`KeyColumns`]: names of the identity columns in the index table
//! - [`FieldMapping`] / [`ColumnRule`]: how index columns are derived
//! - [`FieldMapper`] / [`InclusionFilter`]: optional per-source-type hooks
//!
//! Rows travel between layers as [`Row`], a plain JSON object, so any table
//! shape can be represented without code generation.

mod hooks;
mod index;
mod mapping;
mod record;

pub use hooks::{FieldMapper, InclusionFilter};
pub use index::{IndexRow, KeyColumns, PRIMARY_KEY};
pub use mapping::{ColumnRule, FieldMapping};
pub use record::{SourceRecord, SourceType};

/// A table row keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when converting raw rows into model types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("row has no integer `{0}` column")]
    MissingKey(String),

    #[error("column `{column}` has unexpected value: {value}")]
    InvalidValue {
        column: String,
        value: serde_json::Value,
    },
}
