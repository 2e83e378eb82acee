use std::collections::BTreeMap;

use postable_model::{ColumnRule, KeyColumns};
use serde::{Deserialize, Serialize};

fn default_storage_target() -> String {
    "posts".to_string()
}

/// Per-source-type settings for an [`IndexSynchronizer`](crate::IndexSynchronizer).
///
/// `mapping` only lists overrides; every other non-key column of the
/// storage target is copied from the source field of the same name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Table holding the shared index.
    pub storage_target: String,
    pub mapping: BTreeMap<String, ColumnRule>,
    pub key_columns: KeyColumns,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            storage_target: default_storage_target(),
            mapping: BTreeMap::new(),
            key_columns: KeyColumns::default(),
        }
    }
}

impl IndexSettings {
    pub fn new(storage_target: impl Into<String>) -> Self {
        Self {
            storage_target: storage_target.into(),
            ..Self::default()
        }
    }

    /// Overrides the rule for one index column.
    pub fn with_rule(mut self, column: impl Into<String>, rule: ColumnRule) -> Self {
        self.mapping.insert(column.into(), rule);
        self
    }

    pub fn with_key_columns(mut self, key_columns: KeyColumns) -> Self {
        self.key_columns = key_columns;
        self
    }
}
