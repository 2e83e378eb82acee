use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Row};

/// Surrogate key column of every table the synchronizer touches.
pub const PRIMARY_KEY: &str = "id";

/// Names of the identity columns linking an index row back to its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyColumns {
    pub source_type: String,
    pub source_id: String,
}

impl KeyColumns {
    /// The `model` / `foreign_key` naming used by older index tables.
    pub fn legacy() -> Self {
        Self {
            source_type: "model".to_string(),
            source_id: "foreign_key".to_string(),
        }
    }

    /// All three columns an index table must expose, primary key first.
    pub fn required(&self) -> [&str; 3] {
        [PRIMARY_KEY, self.source_type.as_str(), self.source_id.as_str()]
    }

    pub fn is_key(&self, column: &str) -> bool {
        self.required().contains(&column)
    }
}

impl Default for KeyColumns {
    fn default() -> Self {
        Self {
            source_type: "source_type".to_string(),
            source_id: "source_id".to_string(),
        }
    }
}

/// A row of the shared index table, split into identity and mapped columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub id: i64,
    pub source_type: String,
    pub source_id: i64,
    pub columns: Row,
}

impl IndexRow {
    pub fn from_row(mut row: Row, keys: &KeyColumns) -> crate::Result<Self> {
        let id = take_i64(&mut row, PRIMARY_KEY)?;
        let source_id = take_i64(&mut row, &keys.source_id)?;
        let source_type = match row.remove(&keys.source_type) {
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(Error::InvalidValue {
                    column: keys.source_type.clone(),
                    value: other,
                });
            }
            None => return Err(Error::MissingKey(keys.source_type.clone())),
        };
        Ok(Self {
            id,
            source_type,
            source_id,
            columns: row,
        })
    }

    /// Looks up a mapped column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }
}

fn take_i64(row: &mut Row, column: &str) -> crate::Result<i64> {
    match row.remove(column) {
        Some(v) => v.as_i64().ok_or(Error::InvalidValue {
            column: column.to_string(),
            value: v,
        }),
        None => Err(Error::MissingKey(column.to_string())),
    }
}
