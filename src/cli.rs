//! Command-line interface definitions for Awful Event Harvest.
//!
//! Three subcommands: `run` drives an extraction run, `export` copies the
//! stored records to a timestamped file, `clear` empties the store.
//! Run-configuration flags override the matching keys of the YAML file.

use crate::config::{ConfigOverrides, ExistingPolicy};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Awful Event Harvest application.
///
/// # Examples
///
/// ```sh
/// # Collect everything in links.json into events.json
/// awful_event_harvest run --links links.json --store events.json
///
/// # Smaller batches, a tighter rate limit, no writes
/// awful_event_harvest run -l links.json -s events.json --batch-size 10 --delay-min 5000 --dry-run
///
/// # Export the store
/// awful_event_harvest export --store events.json --out-dir ./exports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect every listed event, batch by batch
    Run(RunArgs),
    /// Write the stored events to <out-dir>/events-<timestamp>.json
    Export {
        /// Path to the event store file
        #[arg(short, long)]
        store: PathBuf,

        /// Directory to write the export into
        #[arg(short, long)]
        out_dir: PathBuf,
    },
    /// Delete the event store file
    Clear {
        /// Path to the event store file
        #[arg(short, long)]
        store: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON file with `upcoming` and `past` event links
    #[arg(short, long)]
    pub links: PathBuf,

    /// Path to the event store file
    #[arg(short, long)]
    pub store: PathBuf,

    /// Optional path to a run configuration YAML file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the event source
    #[arg(long, env = "EVENT_SOURCE_URL", default_value = "http://127.0.0.1:8080/")]
    pub base_url: String,

    /// Identifiers per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Collections in flight at once within a batch
    #[arg(long)]
    pub concurrent_limit: Option<usize>,

    /// Lower bound of the pause between batches, in milliseconds
    #[arg(long)]
    pub delay_min: Option<u64>,

    /// Upper bound of the pause between batches, in milliseconds
    #[arg(long)]
    pub delay_max: Option<u64>,

    /// Wait between navigating and extracting, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Per-event time limit in milliseconds (0 disables it)
    #[arg(long)]
    pub item_timeout_ms: Option<u64>,

    /// What to do with events already in the store
    #[arg(long, value_enum)]
    pub on_existing: Option<ExistingPolicy>,

    /// Retry a failed navigation this many times with backoff
    #[arg(long, default_value_t = 0)]
    pub navigate_retries: usize,

    /// Keep results in memory only; the store file is read but never written
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            batch_size: self.batch_size,
            concurrent_limit: self.concurrent_limit,
            delay_min: self.delay_min,
            delay_max: self.delay_max,
            settle_ms: self.settle_ms,
            item_timeout_ms: self.item_timeout_ms,
            on_existing: self.on_existing,
        }
    }
}
