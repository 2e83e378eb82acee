use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, PRIMARY_KEY, Row};

/// A source type: the name recorded in the index and the table holding its records.
///
/// Several source types may share one table, e.g. two views over `books`
/// that are indexed under different names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceType {
    pub name: String,
    pub table: String,
}

impl SourceType {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
        }
    }
}

/// One persisted record of a source type.
///
/// `fields` may be partial: an update typically carries only the columns
/// that changed, plus the identity key held in `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: i64,
    pub fields: Row,
}

impl SourceRecord {
    pub fn new(id: i64, fields: Row) -> Self {
        Self { id, fields }
    }

    /// Builds a record from a stored row, reading the identity from its `id` column.
    pub fn from_row(fields: Row) -> crate::Result<Self> {
        let id = fields
            .get(PRIMARY_KEY)
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::MissingKey(PRIMARY_KEY.to_string()))?;
        Ok(Self { id, fields })
    }

    /// Returns a field value, treating an explicit JSON null as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }
}
