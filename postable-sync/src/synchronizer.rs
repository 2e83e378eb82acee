//! Keeps one source type's rows in the shared index table up to date.

use std::num::NonZeroUsize;
use std::sync::Arc;

use postable_model::{
    ColumnRule, FieldMapper, FieldMapping, InclusionFilter, IndexRow, KeyColumns, PRIMARY_KEY,
    Row, SourceRecord, SourceType,
};
use postable_storage::{Criteria, Persistence, Query};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, SyncError, SyncResult};
use crate::settings::IndexSettings;

/// What [`IndexSynchronizer::on_save`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The inclusion filter rejected the record; any stale row was removed.
    Excluded,
    /// No mapped column had a value, so nothing was written.
    Skipped,
    /// A new index row was written with this id.
    Inserted(i64),
    /// The existing index row with this id was updated.
    Updated(i64),
}

/// Counts from one [`IndexSynchronizer::rebuild_index`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Index rows deleted before re-indexing.
    pub removed: usize,
    pub indexed: usize,
    pub excluded: usize,
    pub skipped: usize,
}

/// Synchronizes the index rows of a single source type.
///
/// Built with [`configure`](Self::configure), which checks the storage
/// target's schema and derives the field mapping. Hooks are attached with
/// [`with_field_mapper`](Self::with_field_mapper) and
/// [`with_inclusion_filter`](Self::with_inclusion_filter).
pub struct IndexSynchronizer {
    store: Arc<dyn Persistence>,
    source: SourceType,
    target: String,
    keys: KeyColumns,
    mapping: FieldMapping,
    mapper: Option<Arc<dyn FieldMapper>>,
    filter: Option<Arc<dyn InclusionFilter>>,
}

impl std::fmt::Debug for IndexSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSynchronizer")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("keys", &self.keys)
            .field("mapping", &self.mapping)
            .field("mapper", &self.mapper.is_some())
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

impl IndexSynchronizer {
    /// Validates the storage target and builds the effective field mapping.
    ///
    /// The target must exist and expose `id` plus both identity columns.
    /// Every other target column maps to the source field of the same name
    /// unless `settings.mapping` overrides it.
    pub fn configure(
        store: Arc<dyn Persistence>,
        source: SourceType,
        settings: IndexSettings,
    ) -> SyncResult<Self> {
        let IndexSettings {
            storage_target: target,
            mapping: overrides,
            key_columns: keys,
        } = settings;

        let columns = store
            .schema(&target)?
            .ok_or_else(|| ConfigurationError::StorageTargetNotFound(target.clone()))?;

        let missing: Vec<String> = keys
            .required()
            .iter()
            .filter(|required| !columns.iter().any(|c| c == *required))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigurationError::MissingColumns { target, missing }.into());
        }

        for column in overrides.keys() {
            if keys.is_key(column) {
                return Err(ConfigurationError::KeyColumnOverride {
                    source_type: source.name.clone(),
                    column: column.clone(),
                }
                .into());
            }
            if !columns.contains(column) {
                return Err(ConfigurationError::UnknownColumn {
                    source_type: source.name.clone(),
                    target,
                    column: column.clone(),
                }
                .into());
            }
        }

        let mapping = FieldMapping::identity(columns.into_iter().filter(|c| !keys.is_key(c)))
            .merged(&overrides);

        info!(
            source_type = %source.name,
            storage_target = %target,
            columns = mapping.len(),
            "index synchronizer configured"
        );

        Ok(Self {
            store,
            source,
            target,
            keys,
            mapping,
            mapper: None,
            filter: None,
        })
    }

    /// Attaches the hook used for [`ColumnRule::Callback`] columns.
    pub fn with_field_mapper(mut self, mapper: impl FieldMapper + 'static) -> Self {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Attaches a filter deciding which records belong in the index.
    pub fn with_inclusion_filter(mut self, filter: impl InclusionFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    pub fn source_type(&self) -> &SourceType {
        &self.source
    }

    pub fn storage_target(&self) -> &str {
        &self.target
    }

    pub fn key_columns(&self) -> &KeyColumns {
        &self.keys
    }

    /// The effective mapping: defaults merged with overrides.
    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Computes the mapped columns for `record`, without identity columns.
    ///
    /// Callback columns are left out when no field mapper is attached, and
    /// source fields that are absent or null are left out.
    pub fn map_fields(&self, record: &SourceRecord) -> Row {
        let mut row = Row::new();
        for (column, rule) in self.mapping.iter() {
            match rule {
                ColumnRule::Omit => {}
                ColumnRule::Callback => {
                    if let Some(mapper) = &self.mapper {
                        row.insert(column.to_string(), mapper.map_field(column, record));
                    }
                }
                ColumnRule::SourceField(field) => {
                    if let Some(value) = record.get(field) {
                        row.insert(column.to_string(), value.clone());
                    }
                }
            }
        }
        row
    }

    /// Brings the index row for `record` up to date after it was saved.
    ///
    /// For an update (`is_new == false`) the existing index row is looked up
    /// by source identity and updated in place; only the mapped columns
    /// present in `record` are written.
    pub fn on_save(&self, record: &SourceRecord, is_new: bool) -> SyncResult<SaveOutcome> {
        if let Some(filter) = &self.filter {
            if !filter.include(record) {
                if !is_new {
                    if let Some(id) = self.existing_id(record.id)? {
                        self.store.delete(&self.target, id)?;
                        debug!(
                            source_type = %self.source.name,
                            source_id = record.id,
                            index_id = id,
                            "removed index row of excluded record"
                        );
                    }
                }
                debug!(source_type = %self.source.name, source_id = record.id, "record excluded");
                return Ok(SaveOutcome::Excluded);
            }
        }

        let mut row = self.map_fields(record);
        if row.is_empty() {
            debug!(source_type = %self.source.name, source_id = record.id, "nothing to index");
            return Ok(SaveOutcome::Skipped);
        }

        row.insert(
            self.keys.source_type.clone(),
            Value::from(self.source.name.as_str()),
        );
        row.insert(self.keys.source_id.clone(), Value::from(record.id));

        let existing = if is_new {
            None
        } else {
            self.existing_id(record.id)?
        };
        if let Some(id) = existing {
            row.insert(PRIMARY_KEY.to_string(), Value::from(id));
        }

        let stored = self.store.save(&self.target, row)?;
        let id = stored
            .get(PRIMARY_KEY)
            .and_then(Value::as_i64)
            .ok_or_else(|| postable_model::Error::MissingKey(PRIMARY_KEY.to_string()))?;

        debug!(
            source_type = %self.source.name,
            source_id = record.id,
            index_id = id,
            updated = existing.is_some(),
            "index row saved"
        );
        Ok(match existing {
            Some(_) => SaveOutcome::Updated(id),
            None => SaveOutcome::Inserted(id),
        })
    }

    /// Removes the index row of a deleted source record, if there is one.
    pub fn on_delete(&self, source_id: i64) -> SyncResult<bool> {
        let Some(id) = self.existing_id(source_id)? else {
            return Ok(false);
        };
        let removed = self.store.delete(&self.target, id)?;
        debug!(source_type = %self.source.name, source_id, index_id = id, "index row deleted");
        Ok(removed)
    }

    /// Deletes every index row of this source type and re-indexes all source
    /// records, `batch_size` at a time (all at once when `None`).
    ///
    /// There is no checkpointing: if interrupted, the index is left partially
    /// populated for this source type until the next rebuild.
    pub fn rebuild_index(&self, batch_size: Option<NonZeroUsize>) -> SyncResult<RebuildReport> {
        let removed = self.store.delete_all(&self.target, &self.type_criteria())?;
        let mut report = RebuildReport {
            removed,
            ..RebuildReport::default()
        };

        let total = self.store.count(&self.source.table, &Criteria::all())?;
        info!(
            source_type = %self.source.name,
            removed,
            total,
            "rebuilding index"
        );
        if total == 0 {
            return Ok(report);
        }

        let mut offset = 0;
        loop {
            let mut query = Query::all().offset(offset);
            if let Some(size) = batch_size {
                query = query.limit(size.get());
            }
            let batch = self.store.find(&self.source.table, &query)?;
            let fetched = batch.len();
            offset += fetched;

            for row in batch {
                let record = SourceRecord::from_row(row).inspect_err(|err| {
                    warn!(
                        source_type = %self.source.name,
                        table = %self.source.table,
                        error = %err,
                        "source row cannot be indexed"
                    );
                })?;
                match self.on_save(&record, true)? {
                    SaveOutcome::Inserted(_) | SaveOutcome::Updated(_) => report.indexed += 1,
                    SaveOutcome::Excluded => report.excluded += 1,
                    SaveOutcome::Skipped => report.skipped += 1,
                }
            }

            if batch_size.is_none_or(|size| fetched < size.get()) {
                break;
            }
        }

        info!(
            source_type = %self.source.name,
            indexed = report.indexed,
            excluded = report.excluded,
            skipped = report.skipped,
            "index rebuilt"
        );
        Ok(report)
    }

    /// The index row for one source record.
    pub fn find_entry(&self, source_id: i64) -> SyncResult<Option<IndexRow>> {
        self.store
            .find_first(&self.target, &self.identity_criteria(source_id))?
            .map(|row| IndexRow::from_row(row, &self.keys).map_err(SyncError::from))
            .transpose()
    }

    /// Every index row of this source type, ordered by id.
    pub fn entries(&self) -> SyncResult<Vec<IndexRow>> {
        self.store
            .find(&self.target, &Query::new(self.type_criteria()))?
            .into_iter()
            .map(|row| IndexRow::from_row(row, &self.keys).map_err(SyncError::from))
            .collect()
    }

    fn type_criteria(&self) -> Criteria {
        Criteria::all().eq(self.keys.source_type.as_str(), self.source.name.as_str())
    }

    fn identity_criteria(&self, source_id: i64) -> Criteria {
        self.type_criteria().eq(self.keys.source_id.as_str(), source_id)
    }

    fn existing_id(&self, source_id: i64) -> SyncResult<Option<i64>> {
        Ok(self
            .store
            .find_first(&self.target, &self.identity_criteria(source_id))?
            .and_then(|row| row.get(PRIMARY_KEY).and_then(Value::as_i64)))
    }
}
