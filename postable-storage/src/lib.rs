//! Persistence layer for Postable.
//!
//! The synchronizer never talks to a database directly; it goes through the
//! [`Persistence`] trait, which models a small table-generic CRUD surface:
//! schema introspection, equality lookups, insert-or-update and deletes.
//!
//! # Implementations
//!
//! - [`MemoryStore`] keeps tables in process memory. Tables are declared up
//!   front with [`TableDef`] so column defaults behave like a real schema.
//! - [`SqliteStore`] runs against a SQLite file through rusqlite. Tables are
//!   created by the application; the store only reads their schema.
//!
//! Rows are [`Row`](postable_model::Row) values. Every table is assumed to
//! have an integer `id` primary key.

mod error;
mod memory;
mod persistence;
mod query;
mod sqlite;

pub use error::{StorageError, StorageResult};
pub use memory::{MemoryStore, TableDef};
pub use persistence::Persistence;
pub use query::{Criteria, Query};
pub use sqlite::SqliteStore;
