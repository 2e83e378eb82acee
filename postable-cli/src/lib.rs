//! Command implementations for the `postable` binary.
//!
//! Every command opens the SQLite database named in the config file and
//! builds one [`IndexSynchronizer`] per configured source. Sources that rely
//! on callback rules get no field mapper here, so those columns are omitted.
//! The database file must already exist; it is never created here.

use std::io::Write;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use postable_model::ColumnRule;
use postable_storage::{Persistence, SqliteStore};
use postable_sync::{IndexSynchronizer, PostableConfig, SourceConfig};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "postable")]
#[command(about = "Keeps a shared index table in sync with its source tables")]
pub struct Args {
    /// Path to the postable.toml config file
    #[arg(short, long, default_value = "postable.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate every source against the database schema and print its mapping
    Check,
    /// Delete and regenerate index rows
    Rebuild {
        /// Only rebuild this source (default: all sources)
        #[arg(short, long)]
        source: Option<String>,

        /// Records per batch, overriding the config file
        #[arg(short, long)]
        batch_size: Option<NonZeroUsize>,
    },
}

/// Runs a parsed command, writing human-readable results to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let config = PostableConfig::load_from(&args.config)
        .with_context(|| format!("Failed to load config {:?}", args.config))?;
    let store: Arc<dyn Persistence> = Arc::new(
        SqliteStore::open_existing(&config.database)
            .with_context(|| format!("Failed to open database {:?}", config.database))?,
    );
    info!("Using database {:?}", config.database);

    match &args.command {
        Command::Check => check(&config, store, out),
        Command::Rebuild { source, batch_size } => {
            rebuild(&config, store, source.as_deref(), *batch_size, out)
        }
    }
}

fn synchronizer(store: Arc<dyn Persistence>, source: &SourceConfig) -> Result<IndexSynchronizer> {
    let sync = IndexSynchronizer::configure(store, source.source_type(), source.settings.clone())
        .with_context(|| format!("Source `{}` is misconfigured", source.name))?;
    if sync
        .mapping()
        .iter()
        .any(|(_, rule)| *rule == ColumnRule::Callback)
    {
        warn!(
            source_type = %source.name,
            "callback columns have no field mapper on the command line and will be omitted"
        );
    }
    Ok(sync)
}

fn check(config: &PostableConfig, store: Arc<dyn Persistence>, out: &mut impl Write) -> Result<()> {
    for source in &config.sources {
        let sync = synchronizer(Arc::clone(&store), source)?;
        writeln!(
            out,
            "{} ({}) -> {}",
            source.name,
            source.table,
            sync.storage_target()
        )?;
        for (column, rule) in sync.mapping().iter() {
            let described = match rule {
                ColumnRule::Omit => "omitted".to_string(),
                ColumnRule::Callback => "callback".to_string(),
                ColumnRule::SourceField(field) => format!("<- {field}"),
            };
            writeln!(out, "  {column}: {described}")?;
        }
    }
    writeln!(out, "{} source(s) OK", config.sources.len())?;
    Ok(())
}

fn rebuild(
    config: &PostableConfig,
    store: Arc<dyn Persistence>,
    only: Option<&str>,
    batch_size: Option<NonZeroUsize>,
    out: &mut impl Write,
) -> Result<()> {
    let sources: Vec<&SourceConfig> = match only {
        Some(name) => match config.source(name) {
            Some(source) => vec![source],
            None => bail!("No source named `{name}` is configured"),
        },
        None => config.sources.iter().collect(),
    };

    for source in sources {
        let sync = synchronizer(Arc::clone(&store), source)?;
        let report = sync
            .rebuild_index(batch_size.or(source.batch_size))
            .with_context(|| format!("Rebuild of `{}` failed", source.name))?;
        writeln!(
            out,
            "{}: removed {}, indexed {}, excluded {}, skipped {}",
            source.name, report.removed, report.indexed, report.excluded, report.skipped
        )?;
    }
    Ok(())
}
