//! In-process store, used by tests and by embedders without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use postable_model::{PRIMARY_KEY, Row};
use serde_json::Value;
use tracing::debug;

use crate::persistence::row_id;
use crate::{Criteria, Persistence, Query, StorageError, StorageResult};

/// Declares a table for [`MemoryStore`]: its columns and their defaults.
///
/// The `id` column is always present and need not be declared.
#[derive(Debug, Clone)]
pub struct TableDef {
    name: String,
    columns: Vec<(String, Value)>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: vec![(PRIMARY_KEY.to_string(), Value::Null)],
        }
    }

    /// Adds a column defaulting to null.
    pub fn column(self, name: impl Into<String>) -> Self {
        self.column_default(name, Value::Null)
    }

    /// Adds a column with the value new rows get when none is supplied.
    pub fn column_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        let name = name.into();
        if name != PRIMARY_KEY {
            self.columns.push((name, default.into()));
        }
        self
    }
}

#[derive(Debug)]
struct Table {
    columns: Vec<(String, Value)>,
    rows: BTreeMap<i64, Row>,
}

impl Table {
    fn check_columns(&self, table: &str, row: &Row) -> StorageResult<()> {
        match row
            .keys()
            .find(|k| !self.columns.iter().any(|(c, _)| c == *k))
        {
            Some(column) => Err(StorageError::UnknownColumn {
                table: table.to_string(),
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }

    fn next_id(&self, table: &str) -> StorageResult<i64> {
        match self.rows.keys().next_back() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| {
                StorageError::InvalidData(format!("no id left after {max} in `{table}`"))
            }),
        }
    }
}

/// A [`Persistence`] implementation holding all tables in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates (or replaces) a table.
    pub fn create_table(&self, def: TableDef) -> StorageResult<()> {
        let mut tables = self.write()?;
        debug!(table = %def.name, columns = def.columns.len(), "creating in-memory table");
        tables.insert(
            def.name,
            Table {
                columns: def.columns,
                rows: BTreeMap::new(),
            },
        );
        Ok(())
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<String, Table>>> {
        self.tables.read().map_err(|_| StorageError::Poisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<String, Table>>> {
        self.tables.write().map_err(|_| StorageError::Poisoned)
    }
}

impl Persistence for MemoryStore {
    fn schema(&self, table: &str) -> StorageResult<Option<Vec<String>>> {
        let tables = self.read()?;
        Ok(tables
            .get(table)
            .map(|t| t.columns.iter().map(|(c, _)| c.clone()).collect()))
    }

    fn find(&self, table: &str, query: &Query) -> StorageResult<Vec<Row>> {
        let tables = self.read()?;
        let t = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        let matching = t
            .rows
            .values()
            .filter(|row| query.criteria.matches(row))
            .skip(query.offset)
            .cloned();
        Ok(match query.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn count(&self, table: &str, criteria: &Criteria) -> StorageResult<usize> {
        let tables = self.read()?;
        let t = tables
            .get(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        Ok(t.rows.values().filter(|row| criteria.matches(row)).count())
    }

    fn save(&self, table: &str, row: Row) -> StorageResult<Row> {
        let mut tables = self.write()?;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        t.check_columns(table, &row)?;

        let id = row_id(&row)?;
        if let Some(existing) = id.and_then(|id| t.rows.get_mut(&id)) {
            for (column, value) in row {
                existing.insert(column, value);
            }
            return Ok(existing.clone());
        }

        let id = match id {
            Some(id) => id,
            None => t.next_id(table)?,
        };
        let mut stored: Row = t.columns.iter().cloned().collect();
        stored.extend(row);
        stored.insert(PRIMARY_KEY.to_string(), Value::from(id));
        t.rows.insert(id, stored.clone());
        Ok(stored)
    }

    fn delete(&self, table: &str, id: i64) -> StorageResult<bool> {
        let mut tables = self.write()?;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        Ok(t.rows.remove(&id).is_some())
    }

    fn delete_all(&self, table: &str, criteria: &Criteria) -> StorageResult<usize> {
        let mut tables = self.write()?;
        let t = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?;
        let before = t.rows.len();
        t.rows.retain(|_, row| !criteria.matches(row));
        Ok(before - t.rows.len())
    }
}
