//! Postable command-line tool.
//!
//! Usage:
//!   postable --config postable.toml check
//!   postable --config postable.toml rebuild --source Book --batch-size 500

use anyhow::Result;
use clap::Parser;
use postable_cli::{Args, run};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    run(&args, &mut std::io::stdout().lock())
}
