//! Index synchronization for Postable.
//!
//! Keeps a shared index table (e.g. `posts`) in step with any number of
//! source tables so heterogeneous records can be queried through one schema.
//! Each source type gets its own [`IndexSynchronizer`], configured once and
//! then driven by the caller's lifecycle events:
//!
//! - [`IndexSynchronizer::on_save`] after a source record is created or updated
//! - [`IndexSynchronizer::on_delete`] after a source record is deleted
//! - [`IndexSynchronizer::rebuild_index`] to regenerate every row of one source type
//!
//! # Example
//!
//! ```rust,ignore
//! let store: Arc<dyn Persistence> = Arc::new(SqliteStore::open("app.db")?);
//! let books = IndexSynchronizer::configure(
//!     Arc::clone(&store),
//!     SourceType::new("Book", "books"),
//!     IndexSettings::default().with_rule("region", ColumnRule::field("country")),
//! )?;
//!
//! books.on_save(&record, true)?;
//! books.on_delete(record.id)?;
//! ```

mod config;
mod error;
mod settings;
mod synchronizer;

pub use config::{PostableConfig, SourceConfig};
pub use error::{ConfigurationError, SyncError, SyncResult};
pub use settings::IndexSettings;
pub use synchronizer::{IndexSynchronizer, RebuildReport, SaveOutcome};
