use serde_json::Value;

use crate::SourceRecord;

/// Derives index column values for a source type.
///
/// Consulted only for columns whose rule is [`ColumnRule::Callback`](crate::ColumnRule::Callback).
/// Closures of the shape `Fn(&str, &SourceRecord) -> Value` implement this
/// trait, so most source types never need a named type.
pub trait FieldMapper: Send + Sync {
    /// Returns the value to store in `column` for `record`.
    fn map_field(&self, column: &str, record: &SourceRecord) -> Value;
}

impl<F> FieldMapper for F
where
    F: Fn(&str, &SourceRecord) -> Value + Send + Sync,
{
    fn map_field(&self, column: &str, record: &SourceRecord) -> Value {
        self(column, record)
    }
}

/// Decides whether a source record belongs in the index at all.
pub trait InclusionFilter: Send + Sync {
    fn include(&self, record: &SourceRecord) -> bool;
}

impl<F> InclusionFilter for F
where
    F: Fn(&SourceRecord) -> bool + Send + Sync,
{
    fn include(&self, record: &SourceRecord) -> bool {
        self(record)
    }
}
