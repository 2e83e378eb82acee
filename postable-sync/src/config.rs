//! File-based configuration, read from a `postable.toml` such as:
//!
//! ```toml
//! database = "app.db"
//!
//! [[source]]
//! name = "Book"
//! table = "books"
//! batch_size = 500
//!
//! [source.mapping]
//! region = "country"
//! title = false
//! ```
//!
//! Each `[[source]]` entry carries the [`IndexSettings`] fields inline.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use postable_model::SourceType;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigurationError;
use crate::settings::IndexSettings;

/// One indexed source type as declared in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub table: String,
    /// Rebuild page size; unset means all records at once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<NonZeroUsize>,
    #[serde(flatten)]
    pub settings: IndexSettings,
}

impl SourceConfig {
    pub fn source_type(&self) -> SourceType {
        SourceType::new(self.name.clone(), self.table.clone())
    }
}

/// Top-level config: where the database lives and which sources to index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostableConfig {
    /// Database file. Relative paths are resolved against the config file's directory.
    pub database: PathBuf,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

impl PostableConfig {
    /// Reads and validates a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            toml::from_str(&contents).map_err(|source| ConfigurationError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.database.is_relative() {
            if let Some(dir) = path.parent() {
                config.database = dir.join(&config.database);
            }
        }
        config.validate()?;

        info!(
            "Loaded config from {:?} ({} sources)",
            path,
            config.sources.len()
        );
        Ok(config)
    }

    /// Rejects duplicate source names.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigurationError::DuplicateSource(source.name.clone()));
            }
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}
