//! SQLite-backed store.
//!
//! Tables are owned by the application; this store only introspects them via
//! `pragma_table_info` and issues plain CRUD statements. Identifiers are
//! always quoted, values always bound as parameters.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use postable_model::{PRIMARY_KEY, Row};
use rusqlite::types::{Type, Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use serde_json::Value;
use tracing::debug;

use crate::persistence::row_id;
use crate::{Criteria, Persistence, Query, StorageError, StorageResult};

/// A [`Persistence`] implementation backed by SQLite.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    /// Opens a database file that must already exist.
    pub fn open_existing(path: impl AsRef<Path>) -> StorageResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        Ok(Self::from_connection(conn))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs raw SQL, typically `CREATE TABLE` statements.
    pub fn execute_batch(&self, sql: &str) -> StorageResult<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl Persistence for SqliteStore {
    fn schema(&self, table: &str) -> StorageResult<Option<Vec<String>>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(if columns.is_empty() {
            None
        } else {
            Some(columns)
        })
    }

    fn find(&self, table: &str, query: &Query) -> StorageResult<Vec<Row>> {
        let conn = self.conn()?;
        let (clause, params) = where_clause(&query.criteria)?;
        let mut sql = format!(
            "SELECT * FROM {}{} ORDER BY {}",
            quote_ident(table),
            clause,
            quote_ident(PRIMARY_KEY)
        );
        match query.limit {
            Some(limit) => sql.push_str(&format!(" LIMIT {limit} OFFSET {}", query.offset)),
            None if query.offset > 0 => sql.push_str(&format!(" LIMIT -1 OFFSET {}", query.offset)),
            None => {}
        }
        select_rows(&conn, &sql, params)
    }

    fn count(&self, table: &str, criteria: &Criteria) -> StorageResult<usize> {
        let conn = self.conn()?;
        let (clause, params) = where_clause(criteria)?;
        let sql = format!("SELECT COUNT(*) FROM {}{}", quote_ident(table), clause);
        let count: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
        Ok(count as usize)
    }

    fn save(&self, table: &str, row: Row) -> StorageResult<Row> {
        let conn = self.conn()?;
        let id = row_id(&row)?;

        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (column, value) in &row {
            if column != PRIMARY_KEY {
                columns.push(column.as_str());
                values.push(to_sql(value)?);
            }
        }

        let updated = match id {
            Some(id) => update_row(&conn, table, id, &columns, values.clone())?,
            None => false,
        };

        let id = if updated {
            id.unwrap_or_default()
        } else {
            insert_row(&conn, table, id, &columns, values)?
        };
        debug!(table, id, updated, "saved row");

        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(PRIMARY_KEY)
        );
        select_rows(&conn, &sql, vec![SqlValue::Integer(id)])?
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::InvalidData(format!("row {id} vanished from `{table}`")))
    }

    fn delete(&self, table: &str, id: i64) -> StorageResult<bool> {
        let conn = self.conn()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(PRIMARY_KEY)
        );
        Ok(conn.execute(&sql, [id])? > 0)
    }

    fn delete_all(&self, table: &str, criteria: &Criteria) -> StorageResult<usize> {
        let conn = self.conn()?;
        let (clause, params) = where_clause(criteria)?;
        let sql = format!("DELETE FROM {}{}", quote_ident(table), clause);
        Ok(conn.execute(&sql, params_from_iter(params))?)
    }
}

/// Updates the given columns of row `id`. Returns false when no such row exists.
fn update_row(
    conn: &Connection,
    table: &str,
    id: i64,
    columns: &[&str],
    mut values: Vec<SqlValue>,
) -> StorageResult<bool> {
    if columns.is_empty() {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(PRIMARY_KEY)
        );
        let n: i64 = conn.query_row(&sql, [id], |row| row.get(0))?;
        return Ok(n > 0);
    }

    let assignments = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", quote_ident(c), i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(table),
        assignments,
        quote_ident(PRIMARY_KEY),
        columns.len() + 1
    );
    values.push(SqlValue::Integer(id));
    Ok(conn.execute(&sql, params_from_iter(values))? > 0)
}

/// Inserts a row, with an explicit id when given. Returns the row's id.
fn insert_row(
    conn: &Connection,
    table: &str,
    id: Option<i64>,
    columns: &[&str],
    mut values: Vec<SqlValue>,
) -> StorageResult<i64> {
    let mut names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    if let Some(id) = id {
        names.push(quote_ident(PRIMARY_KEY));
        values.push(SqlValue::Integer(id));
    }

    if names.is_empty() {
        conn.execute(&format!("INSERT INTO {} DEFAULT VALUES", quote_ident(table)), [])?;
    } else {
        let placeholders = (1..=names.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            names.join(", "),
            placeholders
        );
        conn.execute(&sql, params_from_iter(values))?;
    }
    Ok(id.unwrap_or_else(|| conn.last_insert_rowid()))
}

fn select_rows(conn: &Connection, sql: &str, params: Vec<SqlValue>) -> StorageResult<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            let mut out = Row::new();
            for (idx, name) in names.iter().enumerate() {
                out.insert(name.clone(), from_sql(row.get_ref(idx)?, idx, name)?);
            }
            Ok(out)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn where_clause(criteria: &Criteria) -> StorageResult<(String, Vec<SqlValue>)> {
    if criteria.is_empty() {
        return Ok((String::new(), Vec::new()));
    }
    let mut parts = Vec::with_capacity(criteria.conditions().len());
    let mut params = Vec::with_capacity(criteria.conditions().len());
    for (i, (column, value)) in criteria.conditions().iter().enumerate() {
        parts.push(format!("{} = ?{}", quote_ident(column), i + 1));
        params.push(to_sql(value)?);
    }
    Ok((format!(" WHERE {}", parts.join(" AND ")), params))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_sql(value: &Value) -> StorageResult<SqlValue> {
    Ok(match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(
                n.as_f64()
                    .ok_or_else(|| StorageError::InvalidData(format!("unrepresentable number: {n}")))?,
            ),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => SqlValue::Text(serde_json::to_string(value)?),
    })
}

fn from_sql(value: ValueRef<'_>, idx: usize, column: &str) -> rusqlite::Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) => Value::String(
            std::str::from_utf8(bytes)
                .map_err(rusqlite::Error::Utf8Error)?
                .to_string(),
        ),
        ValueRef::Blob(_) => {
            return Err(rusqlite::Error::InvalidColumnType(
                idx,
                column.to_string(),
                Type::Blob,
            ));
        }
    })
}
