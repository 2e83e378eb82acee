use postable_model::{PRIMARY_KEY, Row};
use serde_json::Value;

use crate::{Criteria, Query, StorageError, StorageResult};

/// Table-generic persistence used by the index synchronizer.
///
/// Every table has an integer `id` primary key. Implementations must be
/// shareable across threads so one store can back several synchronizers.
pub trait Persistence: Send + Sync {
    /// Column names of `table`, or `None` when the table does not exist.
    fn schema(&self, table: &str) -> StorageResult<Option<Vec<String>>>;

    /// Rows matching `query`, ordered by `id`.
    fn find(&self, table: &str, query: &Query) -> StorageResult<Vec<Row>>;

    /// Number of rows matching `criteria`.
    fn count(&self, table: &str, criteria: &Criteria) -> StorageResult<usize>;

    /// Inserts `row` when it carries no `id`; otherwise updates the given
    /// columns of the row with that id, inserting it if none exists.
    /// Returns the row as stored.
    fn save(&self, table: &str, row: Row) -> StorageResult<Row>;

    /// Deletes the row with `id`. Returns whether a row was removed.
    fn delete(&self, table: &str, id: i64) -> StorageResult<bool>;

    /// Deletes every row matching `criteria`, returning how many were removed.
    fn delete_all(&self, table: &str, criteria: &Criteria) -> StorageResult<usize>;

    /// First row (lowest `id`) matching `criteria`.
    fn find_first(&self, table: &str, criteria: &Criteria) -> StorageResult<Option<Row>> {
        let query = Query::new(criteria.clone()).limit(1);
        Ok(self.find(table, &query)?.into_iter().next())
    }
}

/// Reads the primary key of a row about to be saved. Null counts as absent.
pub(crate) fn row_id(row: &Row) -> StorageResult<Option<i64>> {
    match row.get(PRIMARY_KEY) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| StorageError::InvalidData(format!("non-integer id: {v}"))),
    }
}
